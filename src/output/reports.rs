//! Report generation and formatting

use anyhow::{Context, Result};
use prettytable::{format, Cell, Row, Table};

use crate::cleaning::DuplicateEntry;
use crate::sampling::{AcceptanceDecision, BatchOutcome, DecisionReason};

/// Format a compact table with headers and rows using prettytable-rs clean format
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    table.add_row(Row::new(headers.iter().map(|header| Cell::new(header)).collect()));
    for row in rows {
        table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
    }

    // 2-space indent
    table
        .to_string()
        .lines()
        .fold(String::new(), |mut result, line| {
            result.push_str("  ");
            result.push_str(line);
            result.push('\n');
            result
        })
}

/// One row per decision: repository, reason, failing bucket start, commits
pub fn decision_rows(decisions: &[AcceptanceDecision]) -> Vec<Vec<String>> {
    decisions
        .iter()
        .map(|d| {
            vec![
                d.repository.clone(),
                d.reason.code().to_string(),
                d.failing_bucket
                    .as_ref()
                    .map(|b| format!("{} ({} commits)", b.start.format("%Y-%m-%d"), b.count))
                    .unwrap_or_else(|| "-".to_string()),
                d.total_commits.to_string(),
            ]
        })
        .collect()
}

/// Count per reason code, every reason listed even when zero
pub fn reason_summary_rows(outcome: &BatchOutcome) -> Vec<Vec<String>> {
    let counts = outcome.reason_counts();
    [
        DecisionReason::Accepted,
        DecisionReason::InsufficientSpan,
        DecisionReason::LowActivityInterval,
    ]
    .iter()
    .map(|reason| {
        vec![
            reason.code().to_string(),
            counts.get(reason).copied().unwrap_or(0).to_string(),
        ]
    })
    .collect()
}

/// Console summary of a batch: per-repository decisions (when `detailed`),
/// reason totals and failures
pub fn display_batch_summary(outcome: &BatchOutcome, detailed: bool) -> String {
    let mut output = String::new();

    if detailed && !outcome.decisions.is_empty() {
        output.push_str("Decisions:\n");
        output.push_str(&format_compact_table(
            &["Repository", "Reason", "Failing Bucket", "Commits"],
            &decision_rows(&outcome.decisions),
        ));
        output.push('\n');
    }

    output.push_str(&format!(
        "Evaluated {} repositories, {} accepted\n",
        outcome.decisions.len(),
        outcome.accepted_count()
    ));
    output.push_str(&format_compact_table(&["Reason", "Count"], &reason_summary_rows(outcome)));

    if !outcome.failures.is_empty() {
        output.push_str(&format!("\nMalformed input ({}):\n", outcome.failures.len()));
        let rows: Vec<Vec<String>> = outcome
            .failures
            .iter()
            .map(|(identifier, error)| vec![identifier.clone(), error.to_string()])
            .collect();
        output.push_str(&format_compact_table(&["Repository", "Error"], &rows));
    }

    output
}

/// Decisions and failures as a pretty-printed JSON document
pub fn decisions_json(outcome: &BatchOutcome) -> Result<String> {
    let failures: Vec<serde_json::Value> = outcome
        .failures
        .iter()
        .map(|(identifier, error)| {
            serde_json::json!({ "repository": identifier, "error": error.to_string() })
        })
        .collect();

    let report = serde_json::json!({
        "decisions": outcome.decisions,
        "failures": failures,
        "accepted": outcome.accepted_count(),
    });
    serde_json::to_string_pretty(&report).context("Failed to serialize decisions report")
}

pub fn duplicate_rows(duplicates: &[DuplicateEntry]) -> Vec<Vec<String>> {
    duplicates
        .iter()
        .map(|d| vec![format!("{}.", d.position), d.identifier.clone()])
        .collect()
}
