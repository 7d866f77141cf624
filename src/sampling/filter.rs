//! Sampling acceptance filter
//!
//! Decides whether a repository shows sustained activity: at least
//! `min_span_years` of history before the cutoff, and no bucket whose commit
//! count falls below `average / threshold_divisor`, where the average is taken
//! once over every bucket of the repository.

use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::bucket::{ActivityBucket, BucketLayout};
use super::error::{FilterError, FilterResult};

/// Default minimum history span in years
pub const DEFAULT_MIN_SPAN_YEARS: u32 = 20;
/// Default bucket width in months
pub const DEFAULT_BUCKET_MONTHS: u32 = 6;
/// Default divisor applied to the per-bucket average
pub const DEFAULT_THRESHOLD_DIVISOR: f64 = 5.0;

/// How the final, cut-short bucket is compared against the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartialBucketPolicy {
    /// Compare the raw count
    #[default]
    AsIs,
    /// Scale the count up to a full-width rate first
    Scaled,
}

impl FromStr for PartialBucketPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "as-is" | "asis" | "raw" => Ok(PartialBucketPolicy::AsIs),
            "scaled" | "scale" => Ok(PartialBucketPolicy::Scaled),
            _ => Err(format!("Invalid partial bucket policy: {}. Valid options: as-is, scaled", s)),
        }
    }
}

impl fmt::Display for PartialBucketPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialBucketPolicy::AsIs => write!(f, "as-is"),
            PartialBucketPolicy::Scaled => write!(f, "scaled"),
        }
    }
}

/// Adjustable filter parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterConfig {
    pub min_span_years: u32,
    pub bucket_months: u32,
    pub threshold_divisor: f64,
    pub partial_bucket: PartialBucketPolicy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_span_years: DEFAULT_MIN_SPAN_YEARS,
            bucket_months: DEFAULT_BUCKET_MONTHS,
            threshold_divisor: DEFAULT_THRESHOLD_DIVISOR,
            partial_bucket: PartialBucketPolicy::AsIs,
        }
    }
}

impl FilterConfig {
    /// Reject parameters the filter cannot run with
    pub fn validate(&self) -> FilterResult<()> {
        if self.bucket_months == 0 {
            return Err(FilterError::InvalidBucketWidth { months: 0 });
        }
        if !self.threshold_divisor.is_finite() || self.threshold_divisor <= 0.0 {
            return Err(FilterError::InvalidThresholdDivisor {
                divisor: self.threshold_divisor,
            });
        }
        if self.min_span_years.checked_mul(12).is_none() {
            return Err(FilterError::InvalidMinimumSpan {
                years: i64::from(self.min_span_years),
            });
        }
        Ok(())
    }
}

/// Reason code attached to every decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    InsufficientSpan,
    LowActivityInterval,
    Accepted,
}

impl DecisionReason {
    /// Stable reason code used in reports
    pub fn code(&self) -> &'static str {
        match self {
            DecisionReason::InsufficientSpan => "insufficient_span",
            DecisionReason::LowActivityInterval => "low_activity_interval",
            DecisionReason::Accepted => "accepted",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of evaluating one repository
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptanceDecision {
    pub repository: String,
    pub accepted: bool,
    pub reason: DecisionReason,
    /// Earliest bucket under the threshold, for `low_activity_interval`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failing_bucket: Option<ActivityBucket>,
    /// Commits inside the analysis window
    pub total_commits: usize,
    pub bucket_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl AcceptanceDecision {
    fn insufficient_span(repository: &str, total_commits: usize) -> Self {
        Self {
            repository: repository.to_string(),
            accepted: false,
            reason: DecisionReason::InsufficientSpan,
            failing_bucket: None,
            total_commits,
            bucket_count: 0,
            threshold: None,
        }
    }
}

/// A repository and its commit timestamps, sorted on construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCandidate {
    identifier: String,
    timestamps: Vec<DateTime<Utc>>,
}

impl RepositoryCandidate {
    pub fn new<S: Into<String>>(identifier: S, mut timestamps: Vec<DateTime<Utc>>) -> Self {
        timestamps.sort_unstable();
        Self {
            identifier: identifier.into(),
            timestamps,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn first_commit(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    pub fn last_commit(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    pub fn commit_count(&self) -> usize {
        self.timestamps.len()
    }
}

/// The acceptance filter with validated parameters
#[derive(Debug, Clone)]
pub struct AcceptanceFilter {
    config: FilterConfig,
}

impl Default for AcceptanceFilter {
    fn default() -> Self {
        Self {
            config: FilterConfig::default(),
        }
    }
}

impl AcceptanceFilter {
    pub fn new(config: FilterConfig) -> FilterResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Evaluate a repository from raw timestamps
    pub fn evaluate(
        &self,
        identifier: &str,
        timestamps: &[DateTime<Utc>],
        cutoff: DateTime<Utc>,
    ) -> FilterResult<AcceptanceDecision> {
        let candidate = RepositoryCandidate::new(identifier, timestamps.to_vec());
        self.evaluate_candidate(&candidate, cutoff)
    }

    /// Evaluate an already-built candidate
    pub fn evaluate_candidate(
        &self,
        candidate: &RepositoryCandidate,
        cutoff: DateTime<Utc>,
    ) -> FilterResult<AcceptanceDecision> {
        let identifier = candidate.identifier();
        if identifier.trim().is_empty() {
            return Err(FilterError::EmptyIdentifier);
        }

        let Some(first_commit) = candidate.first_commit() else {
            return Ok(AcceptanceDecision::insufficient_span(identifier, 0));
        };
        if cutoff < first_commit {
            return Err(FilterError::NonChronologicalCutoff { first_commit, cutoff });
        }

        let in_window = candidate.timestamps().partition_point(|ts| *ts <= cutoff);
        let span_months = Months::new(self.config.min_span_years * 12);
        let span_satisfied = first_commit
            .checked_add_months(span_months)
            .map_or(false, |required| required <= cutoff);
        if !span_satisfied {
            return Ok(AcceptanceDecision::insufficient_span(identifier, in_window));
        }

        let layout = BucketLayout::covering(first_commit, cutoff, self.config.bucket_months)?;
        if layout.is_empty() {
            return Ok(AcceptanceDecision::insufficient_span(identifier, in_window));
        }

        let counts = layout.count(&candidate.timestamps()[..in_window]);
        let total: usize = counts.iter().sum();
        let average = total as f64 / layout.len() as f64;
        let threshold = average / self.config.threshold_divisor;

        let buckets = layout.buckets(&counts);
        let failing_bucket = buckets
            .iter()
            .enumerate()
            .find(|(index, bucket)| self.effective_count(&layout, *index, bucket) < threshold)
            .map(|(_, bucket)| bucket.clone());

        let (accepted, reason) = match failing_bucket {
            Some(_) => (false, DecisionReason::LowActivityInterval),
            None => (true, DecisionReason::Accepted),
        };

        Ok(AcceptanceDecision {
            repository: identifier.to_string(),
            accepted,
            reason,
            failing_bucket,
            total_commits: total,
            bucket_count: layout.len(),
            threshold: Some(threshold),
        })
    }

    /// Count compared against the threshold, after the partial-bucket policy
    fn effective_count(&self, layout: &BucketLayout, index: usize, bucket: &ActivityBucket) -> f64 {
        let count = bucket.count as f64;
        if !bucket.partial || self.config.partial_bucket == PartialBucketPolicy::AsIs {
            return count;
        }

        let Some((start, nominal_end)) = layout.nominal_bounds(index) else {
            return count;
        };
        let covered = (bucket.end - start).num_seconds();
        let full = (nominal_end - start).num_seconds();
        if covered <= 0 {
            return count;
        }
        count * full as f64 / covered as f64
    }
}

/// Evaluate with the default parameters (20 years, 6-month buckets, divisor 5)
pub fn evaluate(
    identifier: &str,
    timestamps: &[DateTime<Utc>],
    cutoff: DateTime<Utc>,
) -> FilterResult<AcceptanceDecision> {
    AcceptanceFilter::default().evaluate(identifier, timestamps, cutoff)
}
