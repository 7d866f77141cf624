//! Repository sampling and commit-time analysis for mining software repositories
//!
//! The core is [`sampling::AcceptanceFilter`], which keeps repositories with at
//! least twenty years of history and no half-year of markedly low activity.
//! Around it sit the history collector ([`git`]), cleaning stages
//! ([`cleaning`]), immutable project lists ([`snapshot`]) and weekday/hour
//! distributions ([`stats`]).

pub mod app;
pub mod cleaning;
pub mod cli;
pub mod config;
pub mod git;
pub mod logging;
pub mod output;
pub mod sampling;
pub mod snapshot;
pub mod stats;
