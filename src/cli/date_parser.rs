//! Date parsing for cutoff dates and commit timestamps
//!
//! Supports both absolute and relative date formats:
//! - Absolute: ISO 8601 formats like "2023-01-01", "2023-01-01T10:30:00"
//! - Relative: "today", "yesterday", "now", and "N days/weeks/months/years ago"
//!
//! Dates without an offset are taken as UTC so a cutoff means the same
//! instant on every machine.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Error types for date parsing
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DateParseError {
    #[error("Invalid date format: {input}. Expected ISO 8601 (YYYY-MM-DD) or relative format (e.g., '2 years ago')")]
    InvalidFormat { input: String },

    #[error("Invalid relative date: {input}. Expected format like '3 months ago', 'yesterday', 'today'")]
    InvalidRelativeFormat { input: String },

    #[error("Unsupported time unit: {unit}. Supported units: days, weeks, months, years")]
    UnsupportedUnit { unit: String },

    #[error("Invalid number in relative date: {input}")]
    InvalidNumber { input: String },

    #[error("Date out of range: {input}")]
    OutOfRange { input: String },
}

/// Parse a cutoff date relative to the current time
///
/// # Examples
///
/// ```
/// use msr_sampler::cli::date_parser::parse_cutoff;
///
/// let fixed = parse_cutoff("2024-01-01").unwrap();
/// assert_eq!(fixed.to_rfc3339(), "2024-01-01T00:00:00+00:00");
///
/// let relative = parse_cutoff("1 year ago").unwrap();
/// assert!(relative < chrono::Utc::now());
/// ```
pub fn parse_cutoff(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    parse_date(input, Utc::now())
}

/// Parse an absolute or relative date, resolving relative forms against `now`
pub fn parse_date(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, DateParseError> {
    let trimmed = input.trim();

    // Try absolute date formats first
    if let Ok(dt) = parse_timestamp(trimmed) {
        return Ok(dt);
    }

    parse_relative_date(trimmed, now)
}

/// Parse an absolute timestamp (RFC 3339, or naive forms taken as UTC)
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let input = input.trim();

    // Full datetime with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    // git's ISO-like output: "2023-01-01 10:30:00 +0200"
    if let Ok(dt) = DateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive_dt));
        }
    }

    if let Ok(naive_date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let naive_dt = naive_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| DateParseError::InvalidFormat { input: input.to_string() })?;
        return Ok(Utc.from_utc_datetime(&naive_dt));
    }

    Err(DateParseError::InvalidFormat { input: input.to_string() })
}

fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .unwrap_or(ts)
}

/// Parse relative date formats
fn parse_relative_date(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, DateParseError> {
    let input_lower = input.to_lowercase();
    let out_of_range = || DateParseError::OutOfRange { input: input.to_string() };

    match input_lower.as_str() {
        "now" => return Ok(now),
        "today" => return Ok(start_of_day(now)),
        "yesterday" => return Ok(start_of_day(now - Duration::days(1))),
        _ => {}
    }

    // Parse "X unit ago" format
    let parts: Vec<&str> = input_lower.split_whitespace().collect();
    if parts.len() == 3 && parts[2] == "ago" {
        let number = parts[0].parse::<u32>()
            .map_err(|_| DateParseError::InvalidNumber { input: input.to_string() })?;

        // Months and years are calendar arithmetic, not fixed day counts
        let result = match parts[1] {
            "day" | "days" => now.checked_sub_signed(Duration::days(i64::from(number))),
            "week" | "weeks" => now.checked_sub_signed(Duration::weeks(i64::from(number))),
            "month" | "months" => now.checked_sub_months(Months::new(number)),
            "year" | "years" => number
                .checked_mul(12)
                .and_then(|months| now.checked_sub_months(Months::new(months))),
            unit => return Err(DateParseError::UnsupportedUnit { unit: unit.to_string() }),
        };

        return result.ok_or_else(out_of_range);
    }

    Err(DateParseError::InvalidRelativeFormat { input: input.to_string() })
}
