use clap::{Args as ClapArgs, Parser, Subcommand};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use log::{debug, info};

use super::date_parser::parse_cutoff;
use crate::sampling::{FilterConfig, PartialBucketPolicy};
use crate::stats::{Contents, DistributionKind};

/// Sampling and data cleaning for long-lived open source repositories
#[derive(Parser, Debug, Clone)]
#[command(name = "msr-sampler")]
#[command(about = "Selects repositories with sustained long-term activity and prepares their commit data for time-of-day analysis")]
#[command(version)]
pub struct Args {
    /// Verbose output (debug level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION", global = true)]
    pub config_name: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Evaluate cloned repositories and write the accepted list
    Sample {
        /// Project list, one owner/name per line
        #[arg(long, value_name = "FILE")]
        repos: PathBuf,

        /// Directory holding clones as <owner>/<name>
        #[arg(long, value_name = "DIR")]
        clones: Option<PathBuf>,

        /// Drop UTC-only contributors and commits before each contributor's
        /// first non-+0000 commit (defaults to <repos>.qualifying.txt)
        #[arg(long)]
        clean_commits: bool,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Evaluate timestamp records from a JSON file
    Evaluate {
        /// JSON array of {"repository", "timestamps"} records
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// List repositories that share a name across owners
    Duplicates {
        /// Project list, one owner/name per line
        #[arg(long, value_name = "FILE")]
        repos: PathBuf,

        /// Also write the duplicates to this file
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Remove repositories whose last commit is too old from search results
    Inactive {
        /// Search results document with an "items" array
        #[arg(long, value_name = "FILE")]
        results: PathBuf,

        /// Earliest acceptable last-commit year
        #[arg(long, value_name = "YEAR")]
        min_year: Option<i32>,

        /// Cleaned results (defaults to <results>.active.json)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Names of the removed repositories
        #[arg(long, value_name = "FILE", default_value = "repos_to_be_removed.txt")]
        removed: PathBuf,
    },

    /// Commit counts per weekday or hour over multi-year periods
    Distribution {
        /// days or hours
        #[arg(value_name = "KIND")]
        kind: DistributionKind,

        #[arg(long, value_name = "YEAR")]
        start_year: i32,

        #[arg(long, value_name = "YEAR")]
        end_year: i32,

        /// Years per period
        #[arg(long, value_name = "YEARS", default_value_t = 1)]
        interval: u32,

        /// total or proportions
        #[arg(long, value_name = "CONTENTS", default_value = "total")]
        contents: Contents,

        /// Project list, one owner/name per line
        #[arg(long, value_name = "FILE")]
        repos: PathBuf,

        /// Directory holding clones as <owner>/<name>
        #[arg(long, value_name = "DIR")]
        clones: Option<PathBuf>,

        #[arg(long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,
    },

    /// Commits per timezone for each repository, and the most common timezones
    Timezones {
        #[arg(long, value_name = "YEAR", default_value_t = 2004)]
        start_year: i32,

        #[arg(long, value_name = "YEAR", default_value_t = 2023)]
        end_year: i32,

        /// Project list, one owner/name per line
        #[arg(long, value_name = "FILE")]
        repos: PathBuf,

        /// Directory holding clones as <owner>/<name>
        #[arg(long, value_name = "DIR")]
        clones: Option<PathBuf>,

        #[arg(long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,
    },

    /// Percentage of a year's commits recorded with a +0000 offset
    UtcShare {
        #[arg(long, value_name = "YEAR")]
        year: i32,

        /// Project list, one owner/name per line
        #[arg(long, value_name = "FILE")]
        repos: PathBuf,

        /// Directory holding clones as <owner>/<name>
        #[arg(long, value_name = "DIR")]
        clones: Option<PathBuf>,
    },
}

/// Acceptance filter overrides; unset flags fall back to the configuration
#[derive(ClapArgs, Debug, Clone, Default, PartialEq)]
pub struct FilterArgs {
    /// Analysis cutoff (ISO 8601 or relative like "1 year ago"); defaults to now
    #[arg(long, value_name = "DATE")]
    pub cutoff: Option<String>,

    /// Minimum history span before the cutoff
    #[arg(long, value_name = "YEARS")]
    pub min_span_years: Option<u32>,

    /// Bucket width
    #[arg(long, value_name = "MONTHS")]
    pub bucket_months: Option<u32>,

    /// Threshold is the per-bucket average divided by this
    #[arg(long, value_name = "X")]
    pub threshold_divisor: Option<f64>,

    /// Final partial bucket: as-is or scaled
    #[arg(long, value_name = "POLICY")]
    pub partial_bucket: Option<PartialBucketPolicy>,
}

impl FilterArgs {
    /// Overlay the flags that were given onto `base`
    pub fn apply(&self, base: FilterConfig) -> Result<FilterConfig> {
        let config = FilterConfig {
            min_span_years: self.min_span_years.unwrap_or(base.min_span_years),
            bucket_months: self.bucket_months.unwrap_or(base.bucket_months),
            threshold_divisor: self.threshold_divisor.unwrap_or(base.threshold_divisor),
            partial_bucket: self.partial_bucket.unwrap_or(base.partial_bucket),
        };
        config.validate().context("Invalid filter parameters")?;
        Ok(config)
    }

    /// Cutoff from the flag, if given
    pub fn cutoff(&self) -> Result<Option<DateTime<Utc>>> {
        self.cutoff
            .as_deref()
            .map(|value| parse_cutoff(value).with_context(|| format!("Invalid --cutoff: {}", value)))
            .transpose()
    }
}

/// Where and how sampling results are reported
#[derive(ClapArgs, Debug, Clone, Default, PartialEq)]
pub struct ReportArgs {
    /// Accepted list (defaults to <input>.accepted.txt)
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format: table or json
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    pub report: String,

    /// Show one row per repository in the table report
    #[arg(long)]
    pub details: bool,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    debug!("Parsing command line arguments");
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    debug!("Validating CLI argument combinations");

    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    match args.log_format.to_lowercase().as_str() {
        "text" | "json" => {},
        _ => return Err(anyhow::anyhow!(
            "Invalid log format '{}'. Valid options: text, json", args.log_format
        )),
    }

    if let Some(ref level) = args.log_file_level {
        match level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {},
            _ => return Err(anyhow::anyhow!(
                "Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace", level
            )),
        }
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!(
            "--log-file-level requires --log-file to be specified"
        ));
    }

    match &args.command {
        Command::Sample { report, .. } | Command::Evaluate { report, .. } => {
            match report.report.to_lowercase().as_str() {
                "table" | "json" => {},
                _ => return Err(anyhow::anyhow!(
                    "Invalid report format '{}'. Valid options: table, json", report.report
                )),
            }
        }
        Command::Distribution { start_year, end_year, interval, .. } => {
            if start_year > end_year {
                return Err(anyhow::anyhow!(
                    "--start-year {} must not be after --end-year {}", start_year, end_year
                ));
            }
            if *interval == 0 {
                return Err(anyhow::anyhow!("--interval must be at least 1"));
            }
        }
        Command::Timezones { start_year, end_year, .. } if start_year > end_year => {
            return Err(anyhow::anyhow!(
                "--start-year {} must not be after --end-year {}", start_year, end_year
            ));
        }
        _ => {}
    }

    info!("CLI arguments validated successfully");
    Ok(())
}
