//! Repository sampling
//!
//! The acceptance filter and the machinery around it: calendar buckets,
//! malformed-input errors, parallel batch evaluation and candidate input files.

pub mod batch;
pub mod bucket;
pub mod error;
pub mod filter;
pub mod input;

pub use batch::{evaluate_batch, BatchOutcome};
pub use bucket::{ActivityBucket, BucketLayout};
pub use error::{FilterError, FilterResult};
pub use filter::{
    evaluate, AcceptanceDecision, AcceptanceFilter, DecisionReason, FilterConfig,
    PartialBucketPolicy, RepositoryCandidate,
};
