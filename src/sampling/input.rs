//! Candidate timestamp files
//!
//! Input for `evaluate`: a JSON array of `{"repository": "...", "timestamps": [...]}`
//! records produced by an external collector. Timestamps that do not parse are
//! dropped here, before a candidate is built, so the filter never sees them.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::filter::RepositoryCandidate;
use crate::cli::date_parser::parse_timestamp;

/// One repository's raw timestamps as supplied by the collector
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateRecord {
    pub repository: String,
    #[serde(default)]
    pub timestamps: Vec<String>,
}

impl CandidateRecord {
    /// Build a candidate, returning it with the number of timestamps dropped
    pub fn into_candidate(self) -> (RepositoryCandidate, usize) {
        let total = self.timestamps.len();
        let parsed: Vec<DateTime<Utc>> = self
            .timestamps
            .iter()
            .filter_map(|raw| match parse_timestamp(raw) {
                Ok(ts) => Some(ts),
                Err(e) => {
                    debug!("{}: dropping timestamp: {}", self.repository, e);
                    None
                }
            })
            .collect();

        let skipped = total - parsed.len();
        if skipped > 0 {
            warn!("{}: excluded {} unparseable timestamps", self.repository, skipped);
        }
        (RepositoryCandidate::new(self.repository, parsed), skipped)
    }
}

/// Parse candidate records from JSON text
pub fn parse_candidates(content: &str) -> Result<Vec<RepositoryCandidate>> {
    let records: Vec<CandidateRecord> = serde_json::from_str(content)
        .context("Failed to parse candidate records")?;
    Ok(records
        .into_iter()
        .map(|record| record.into_candidate().0)
        .collect())
}

/// Load candidate records from a JSON file
pub fn load_candidates<P: AsRef<Path>>(path: P) -> Result<Vec<RepositoryCandidate>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read candidates file: {}", path.display()))?;
    parse_candidates(&content)
        .with_context(|| format!("Invalid candidates file: {}", path.display()))
}
