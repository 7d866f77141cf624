//! Output formatting and report files

pub mod csv;
pub mod distributions;
pub mod reports;
pub mod timezones;

pub use csv::{csv_escape, to_csv, write_csv};
pub use distributions::{individual_file_name, sanitize_file_name, unique_file_names, write_distribution};
pub use reports::{
    decision_rows,
    decisions_json,
    display_batch_summary,
    duplicate_rows,
    format_compact_table,
    reason_summary_rows,
};
pub use timezones::{write_repository_tally, write_timezone_summary};
