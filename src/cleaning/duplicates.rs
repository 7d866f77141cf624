//! Repositories that share a name across owners
//!
//! Forks and mirrors often appear under several owners with the same
//! repository name. They are listed for manual review rather than removed.

use serde::Serialize;
use std::collections::HashMap;

use crate::snapshot::ProjectList;

/// Name part of an identifier: everything after the first `/`, or empty
pub fn name_part(identifier: &str) -> &str {
    identifier.split_once('/').map(|(_, name)| name).unwrap_or("")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEntry {
    /// 1-based position in the sorted listing
    pub position: usize,
    pub identifier: String,
}

/// Identifiers whose name part occurs more than once, sorted by name part then identifier
pub fn find_duplicates(list: &ProjectList) -> Vec<DuplicateEntry> {
    let occurrences = list.iter().fold(HashMap::new(), |mut counts, identifier| {
        *counts.entry(name_part(identifier)).or_insert(0usize) += 1;
        counts
    });

    let mut duplicates: Vec<&str> = list
        .iter()
        .filter(|identifier| occurrences.get(name_part(identifier)).copied().unwrap_or(0) > 1)
        .collect();
    duplicates.sort_by(|a, b| name_part(a).cmp(name_part(b)).then_with(|| a.cmp(b)));

    duplicates
        .into_iter()
        .enumerate()
        .map(|(i, identifier)| DuplicateEntry {
            position: i + 1,
            identifier: identifier.to_string(),
        })
        .collect()
}
