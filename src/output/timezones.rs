//! Timezone tally files
//!
//! Each repository's tally goes to `commits_per_timezone/<name>_commits_per_timezone.txt`
//! and the count of repositories per most common timezone to
//! `most_common_timezone.txt`.

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::csv::write_csv;
use crate::stats::TimezoneTally;

pub const TIMEZONE_DIR: &str = "commits_per_timezone";
pub const SUMMARY_FILE: &str = "most_common_timezone.txt";

const HEADER: [&str; 2] = ["Timezone", "Commits"];

fn tally_rows(tally: &TimezoneTally) -> Vec<Vec<String>> {
    tally
        .iter()
        .map(|(label, count)| vec![label.to_string(), count.to_string()])
        .collect()
}

/// Write one repository's tally; `file_name` comes from `unique_file_names`
pub fn write_repository_tally<P: AsRef<Path>>(
    output_dir: P,
    file_name: &str,
    tally: &TimezoneTally,
) -> Result<PathBuf> {
    let path = output_dir
        .as_ref()
        .join(TIMEZONE_DIR)
        .join(format!("{}_commits_per_timezone.txt", file_name));
    write_csv(&path, &HEADER, &tally_rows(tally))?;
    Ok(path)
}

/// Write the number of repositories per most common timezone
pub fn write_timezone_summary<P: AsRef<Path>>(output_dir: P, summary: &TimezoneTally) -> Result<PathBuf> {
    let path = output_dir.as_ref().join(SUMMARY_FILE);
    write_csv(&path, &["Timezone", "Repositories"], &tally_rows(summary))?;
    Ok(path)
}
