//! Commit time distributions
//!
//! Counts commits per weekday or per hour of day across multi-year periods,
//! for one repository or combined over many.

pub mod timezone;

use chrono::{Datelike, Timelike};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::git::CommitRecord;
pub use timezone::{cleaned_timestamps, format_offset, ContributorTimezones, TimezoneTally};

/// Error types for period grids
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PeriodError {
    #[error("Invalid period range: start year {start} is after end year {end}")]
    InvalidRange { start: i32, end: i32 },

    #[error("Invalid interval: {interval}. Interval must be a positive number of years")]
    InvalidInterval { interval: i64 },
}

/// Consecutive multi-year periods starting at `start_year`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodGrid {
    start_year: i32,
    end_year: i32,
    interval_years: u32,
}

impl PeriodGrid {
    pub fn new(start_year: i32, end_year: i32, interval_years: u32) -> Result<Self, PeriodError> {
        if start_year > end_year {
            return Err(PeriodError::InvalidRange { start: start_year, end: end_year });
        }
        if interval_years == 0 {
            return Err(PeriodError::InvalidInterval { interval: 0 });
        }
        Ok(Self { start_year, end_year, interval_years })
    }

    /// Whole periods between the start and end years; a trailing remainder is dropped
    pub fn period_count(&self) -> usize {
        let years = i64::from(self.end_year) - i64::from(self.start_year) + 1;
        usize::try_from(years / i64::from(self.interval_years)).unwrap_or(0)
    }

    /// Period holding `year`, if any
    pub fn period_index(&self, year: i32) -> Option<usize> {
        let offset = i64::from(year) - i64::from(self.start_year);
        if offset < 0 {
            return None;
        }
        let index = usize::try_from(offset / i64::from(self.interval_years)).ok()?;
        (index < self.period_count()).then_some(index)
    }

    /// Column labels: `YYYY` for one-year periods, `YYYY-YYYY` otherwise
    pub fn labels(&self) -> Vec<String> {
        let interval = self.interval_years as i32;
        (0..self.period_count() as i32)
            .map(|i| {
                let from = self.start_year + i * interval;
                if interval == 1 {
                    from.to_string()
                } else {
                    format!("{}-{}", from, from + interval - 1)
                }
            })
            .collect()
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_year(&self) -> i32 {
        self.end_year
    }

    pub fn interval_years(&self) -> u32 {
        self.interval_years
    }
}

/// What a distribution's rows measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    Days,
    Hours,
}

const WEEKDAYS: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

impl DistributionKind {
    pub fn row_count(&self) -> usize {
        match self {
            DistributionKind::Days => 7,
            DistributionKind::Hours => 24,
        }
    }

    /// First header cell
    pub fn header(&self) -> &'static str {
        match self {
            DistributionKind::Days => "Day",
            DistributionKind::Hours => "Hour",
        }
    }

    pub fn row_labels(&self) -> Vec<String> {
        match self {
            DistributionKind::Days => WEEKDAYS.iter().map(|d| d.to_string()).collect(),
            DistributionKind::Hours => (0..24).map(|h| format!("{:02}:00", h)).collect(),
        }
    }

    /// Base name used for output files
    pub fn file_stem(&self, contents: Contents) -> &'static str {
        match (self, contents) {
            (DistributionKind::Days, Contents::Total) => "CommitCountsPerDay",
            (DistributionKind::Days, Contents::Proportions) => "CommitPercentagesPerDay",
            (DistributionKind::Hours, Contents::Total) => "CommitCountsPerHour",
            (DistributionKind::Hours, Contents::Proportions) => "CommitPercentagesPerHour",
        }
    }
}

impl FromStr for DistributionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "days" | "day" | "weekdays" => Ok(DistributionKind::Days),
            "hours" | "hour" => Ok(DistributionKind::Hours),
            _ => Err(format!("Invalid distribution: {}. Valid options: days, hours", s)),
        }
    }
}

/// Whether tables hold raw counts or per-period percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Contents {
    #[default]
    Total,
    Proportions,
}

impl FromStr for Contents {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "total" | "totals" | "counts" => Ok(Contents::Total),
            "proportions" | "percentages" => Ok(Contents::Proportions),
            _ => Err(format!("Invalid contents: {}. Valid options: total, proportions", s)),
        }
    }
}

impl fmt::Display for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contents::Total => write!(f, "total"),
            Contents::Proportions => write!(f, "proportions"),
        }
    }
}

/// Commit counts indexed by row (weekday or hour) and period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    kind: DistributionKind,
    grid: PeriodGrid,
    counts: Vec<Vec<u64>>,
}

impl Distribution {
    pub fn new(kind: DistributionKind, grid: PeriodGrid) -> Self {
        Self {
            kind,
            grid,
            counts: vec![vec![0; grid.period_count()]; kind.row_count()],
        }
    }

    /// Build from a repository's commits.
    ///
    /// Only contributors with at least one commit outside +0000 are counted.
    /// Weekdays come from the commit time shifted into the contributor's best
    /// timezone. Hours come from the commit's own recorded offset and only
    /// count commits from the contributor's first non-+0000 commit onward.
    pub fn from_records(kind: DistributionKind, grid: PeriodGrid, records: &[CommitRecord]) -> Self {
        let zones = ContributorTimezones::from_records(records);

        records.iter().fold(Self::new(kind, grid), |mut distribution, record| {
            let local = match kind {
                DistributionKind::Days => zones.corrected(record),
                DistributionKind::Hours => zones.is_activated(record).then_some(record.authored),
            };
            if let Some(local) = local {
                let row = match kind {
                    DistributionKind::Days => local.weekday().num_days_from_monday() as usize,
                    DistributionKind::Hours => local.hour() as usize,
                };
                distribution.record(row, local.year());
            }
            distribution
        })
    }

    fn record(&mut self, row: usize, year: i32) {
        if let Some(period) = self.grid.period_index(year) {
            self.counts[row][period] += 1;
        }
    }

    /// Cell-wise sum of two distributions over the same grid
    pub fn merged(mut self, other: &Distribution) -> Self {
        debug_assert_eq!(self.kind, other.kind);
        debug_assert_eq!(self.grid, other.grid);
        for (row, other_row) in self.counts.iter_mut().zip(&other.counts) {
            for (cell, other_cell) in row.iter_mut().zip(other_row) {
                *cell += other_cell;
            }
        }
        self
    }

    pub fn kind(&self) -> DistributionKind {
        self.kind
    }

    pub fn grid(&self) -> &PeriodGrid {
        &self.grid
    }

    pub fn count(&self, row: usize, period: usize) -> u64 {
        self.counts
            .get(row)
            .and_then(|r| r.get(period))
            .copied()
            .unwrap_or(0)
    }

    pub fn period_total(&self, period: usize) -> u64 {
        self.counts.iter().filter_map(|r| r.get(period)).sum()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Percentage of each period's commits per row; empty periods are all zero
    pub fn proportions(&self) -> Vec<Vec<f64>> {
        let totals: Vec<u64> = (0..self.grid.period_count())
            .map(|p| self.period_total(p))
            .collect();
        self.counts
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&totals)
                    .map(|(&count, &total)| {
                        if total == 0 {
                            0.0
                        } else {
                            count as f64 / total as f64 * 100.0
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Header row for tabular output
    pub fn header(&self) -> Vec<String> {
        std::iter::once(self.kind.header().to_string())
            .chain(self.grid.labels())
            .collect()
    }

    /// Labelled rows for tabular output
    pub fn rows(&self, contents: Contents) -> Vec<Vec<String>> {
        let cells: Vec<Vec<String>> = match contents {
            Contents::Total => self
                .counts
                .iter()
                .map(|row| row.iter().map(u64::to_string).collect())
                .collect(),
            Contents::Proportions => self
                .proportions()
                .iter()
                .map(|row| row.iter().map(f64::to_string).collect())
                .collect(),
        };

        self.kind
            .row_labels()
            .into_iter()
            .zip(cells)
            .map(|(label, row)| std::iter::once(label).chain(row).collect())
            .collect()
    }
}

/// Percentage of a year's commits recorded with a +0000 offset
pub fn utc_share(records: &[CommitRecord], year: i32) -> f64 {
    let (utc_zero, other) = records
        .iter()
        .filter(|r| r.authored.year() == year)
        .fold((0u64, 0u64), |(utc_zero, other), r| {
            if r.is_utc_zero() {
                (utc_zero + 1, other)
            } else {
                (utc_zero, other + 1)
            }
        });

    let total = utc_zero + other;
    if total == 0 {
        0.0
    } else {
        utc_zero as f64 / total as f64 * 100.0
    }
}
