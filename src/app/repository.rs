//! Locating clones and reading their histories

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::config::ConfigManager;
use crate::git::{self, CommitHistory};
use crate::snapshot::ProjectList;

/// Clones directory from the flag, else `[base] clones`
pub fn resolve_clones_dir(clones_arg: Option<&Path>, config: &ConfigManager) -> Result<PathBuf> {
    let path = clones_arg
        .map(Path::to_path_buf)
        .or_else(|| config.get_path("base", "clones"))
        .context("No clones directory given. Use --clones or set 'clones' in the [base] config section")?;

    if !path.is_dir() {
        anyhow::bail!(
            "Directory does not exist: {}\n\nThe clones directory must contain repositories as <owner>/<name>.",
            path.display()
        );
    }
    debug!("Using clones directory: {}", path.display());
    Ok(path)
}

/// Sibling of `input` named `<stem>.<suffix>`, so derived files never replace their input
pub fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}.{}", stem, suffix))
}

/// Refuse to write a derived artifact over the file it was derived from
pub fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
    let same = match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        anyhow::bail!(
            "Output {} would overwrite its input; choose a different --output",
            output.display()
        );
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CollectedHistory {
    pub identifier: String,
    pub history: CommitHistory,
}

/// Histories read for a project list
#[derive(Debug, Clone, Default)]
pub struct HistoryCollection {
    /// In project-list order
    pub collected: Vec<CollectedHistory>,
    /// Listed repositories with no clone, or a clone git could not read
    pub missing: Vec<String>,
}

/// Read every listed repository's history on the rayon pool
pub fn collect_histories(list: &ProjectList, clones_dir: &Path) -> HistoryCollection {
    let results: Vec<(String, Result<CommitHistory>)> = list
        .entries()
        .par_iter()
        .map(|identifier| {
            let path = git::clone_path(clones_dir, identifier);
            let history = if path.exists() {
                git::collect_history(&path)
            } else {
                Err(anyhow::anyhow!("Clone not found: {}", path.display()))
            };
            (identifier.clone(), history)
        })
        .collect();

    let collection = results.into_iter().fold(
        HistoryCollection::default(),
        |mut collection, (identifier, history)| {
            match history {
                Ok(history) => collection.collected.push(CollectedHistory { identifier, history }),
                Err(e) => {
                    warn!("Skipping {}: {:#}", identifier, e);
                    collection.missing.push(identifier);
                }
            }
            collection
        },
    );

    info!(
        "Read histories of {} repositories ({} skipped)",
        collection.collected.len(),
        collection.missing.len()
    );
    collection
}
