//! Removal of repositories without recent commits
//!
//! Works on the search-results document (`{"items": [...]}`) produced by the
//! repository search. Fields this module does not interpret are carried
//! through unchanged.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::snapshot::ProjectList;

/// Repositories whose last commit predates this year are inactive
pub const DEFAULT_MIN_LAST_COMMIT_YEAR: i32 = 2015;

const SEARCH_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub name: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "lastCommit")]
    pub last_commit: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SearchResultItem {
    pub fn last_commit_year(&self) -> Result<i32> {
        let parsed = NaiveDateTime::parse_from_str(&self.last_commit, SEARCH_TIMESTAMP_FORMAT)
            .with_context(|| {
                format!("Invalid lastCommit '{}' for repository {}", self.last_commit, self.name)
            })?;
        Ok(parsed.year())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub items: Vec<SearchResultItem>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of removing inactive repositories
#[derive(Debug, Clone)]
pub struct InactiveSplit {
    /// The input document with only active items
    pub kept: SearchResults,
    /// Names of the removed repositories, in input order
    pub removed: ProjectList,
}

/// Split results into active items and removed names.
///
/// Any item whose `lastCommit` cannot be parsed fails the whole split.
pub fn split_inactive(results: &SearchResults, min_year: i32) -> Result<InactiveSplit> {
    let mut kept = Vec::with_capacity(results.items.len());
    let mut removed = Vec::new();

    for item in &results.items {
        let year = item.last_commit_year()?;
        if year >= min_year {
            kept.push(item.clone());
        } else {
            debug!("Removing inactive repository: {} (last commit: {})", item.name, year);
            removed.push(item.name.clone());
        }
    }

    info!(
        "Inactive filter: {} kept, {} removed (last commit before {})",
        kept.len(),
        removed.len(),
        min_year
    );

    Ok(InactiveSplit {
        kept: SearchResults {
            items: kept,
            extra: results.extra.clone(),
        },
        removed: ProjectList::new("repos_to_be_removed", removed),
    })
}

pub fn load_results<P: AsRef<Path>>(path: P) -> Result<SearchResults> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read search results: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse search results: {}", path.display()))
}

/// Write results as 4-space indented JSON
pub fn write_results<P: AsRef<Path>>(results: &SearchResults, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    results
        .serialize(&mut serializer)
        .context("Failed to serialize search results")?;

    fs::write(path, buffer)
        .with_context(|| format!("Failed to write search results: {}", path.display()))?;
    info!("Wrote {} items to {}", results.items.len(), path.display());
    Ok(())
}
