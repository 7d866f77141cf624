//! Acceptance filter error types
//!
//! Rejections are returned as decisions, never as errors. Every variant here is
//! a contract violation by the caller (malformed input) and must not be
//! coerced into a decision.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Malformed input reaching the acceptance filter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Repository identifier is empty or blank
    #[error("Malformed input: repository identifier must not be empty")]
    EmptyIdentifier,

    /// Identifier appears more than once within a batch
    #[error("Malformed input: repository '{identifier}' appears more than once in the batch")]
    DuplicateIdentifier { identifier: String },

    /// Bucket width must be a positive number of months
    #[error("Malformed input: bucket width must be a positive number of months, got {months}")]
    InvalidBucketWidth { months: i64 },

    /// Threshold divisor must be a positive finite number
    #[error("Malformed input: threshold divisor must be a positive finite number, got {divisor}")]
    InvalidThresholdDivisor { divisor: f64 },

    /// Minimum span must be representable in months
    #[error("Malformed input: minimum span of {years} years is out of range")]
    InvalidMinimumSpan { years: i64 },

    /// Cutoff date lies before the first commit
    #[error("Malformed input: cutoff {cutoff} is earlier than the first commit at {first_commit}")]
    NonChronologicalCutoff {
        first_commit: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    },

    /// Bucket boundaries fall outside the representable calendar
    #[error("Malformed input: bucket boundaries for {first_commit}..{cutoff} are out of calendar range")]
    CalendarOverflow {
        first_commit: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    },
}

impl FilterError {
    /// Create a duplicate identifier error
    pub fn duplicate_identifier<S: Into<String>>(identifier: S) -> Self {
        Self::DuplicateIdentifier { identifier: identifier.into() }
    }
}
