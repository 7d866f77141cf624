//! Command line parsing

pub mod args;
pub mod date_parser;

pub use args::{parse_args, validate_args, Args, Command, FilterArgs, ReportArgs};
