//! Parallel evaluation of candidate batches
//!
//! Candidates are evaluated on the rayon pool with no shared mutable state.
//! The accepted list is built afterwards from the collected decisions, sorted
//! by identifier, so the outcome does not depend on evaluation order.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};

use super::error::{FilterError, FilterResult};
use super::filter::{AcceptanceDecision, AcceptanceFilter, DecisionReason, RepositoryCandidate};
use crate::snapshot::ProjectList;

/// Decisions and per-candidate failures for one batch
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub decisions: Vec<AcceptanceDecision>,
    pub failures: Vec<(String, FilterError)>,
}

impl BatchOutcome {
    /// Accepted identifiers as a new project list
    pub fn accepted<S: Into<String>>(&self, label: S) -> ProjectList {
        ProjectList::new(
            label,
            self.decisions
                .iter()
                .filter(|d| d.accepted)
                .map(|d| d.repository.as_str()),
        )
    }

    /// Number of decisions per reason code
    pub fn reason_counts(&self) -> BTreeMap<DecisionReason, usize> {
        self.decisions.iter().fold(BTreeMap::new(), |mut counts, d| {
            *counts.entry(d.reason).or_insert(0) += 1;
            counts
        })
    }

    pub fn accepted_count(&self) -> usize {
        self.decisions.iter().filter(|d| d.accepted).count()
    }
}

/// Evaluate every candidate against the same cutoff.
///
/// Duplicate identifiers are a contract violation and fail the whole batch.
/// Malformed individual candidates are reported in `failures` and excluded.
pub fn evaluate_batch(
    filter: &AcceptanceFilter,
    candidates: &[RepositoryCandidate],
    cutoff: DateTime<Utc>,
) -> FilterResult<BatchOutcome> {
    let mut seen = HashSet::with_capacity(candidates.len());
    if let Some(duplicate) = candidates.iter().find(|c| !seen.insert(c.identifier())) {
        return Err(FilterError::duplicate_identifier(duplicate.identifier()));
    }

    debug!("Evaluating {} candidates against cutoff {}", candidates.len(), cutoff);

    let results: Vec<(String, FilterResult<AcceptanceDecision>)> = candidates
        .par_iter()
        .map(|candidate| {
            (
                candidate.identifier().to_string(),
                filter.evaluate_candidate(candidate, cutoff),
            )
        })
        .collect();

    let mut outcome = results
        .into_iter()
        .fold(BatchOutcome::default(), |mut outcome, (identifier, result)| {
            match result {
                Ok(decision) => {
                    debug!("{}: {}", identifier, decision.reason);
                    outcome.decisions.push(decision);
                }
                Err(e) => {
                    warn!("Excluding {}: {}", identifier, e);
                    outcome.failures.push((identifier, e));
                }
            }
            outcome
        });

    outcome.decisions.sort_by(|a, b| a.repository.cmp(&b.repository));
    outcome.failures.sort_by(|a, b| a.0.cmp(&b.0));

    info!(
        "Evaluated {} candidates: {} accepted, {} rejected, {} failed",
        candidates.len(),
        outcome.accepted_count(),
        outcome.decisions.len() - outcome.accepted_count(),
        outcome.failures.len()
    );
    Ok(outcome)
}
