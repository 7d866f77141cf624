//! Calendar-aligned activity buckets
//!
//! Bucket boundaries sit on month indices (counted from January of year 0) that
//! are multiples of the bucket width. With the default width of six months
//! every boundary falls on January 1st or July 1st, whatever the repository's
//! first commit date, so buckets line up across repositories.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;

use super::error::{FilterError, FilterResult};

/// A calendar interval `[start, end)` and the commits that fell inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: usize,
    /// True when the bucket was cut short by the cutoff date
    pub partial: bool,
}

/// Month index of a timestamp, counted from January of year 0
pub fn month_index(ts: &DateTime<Utc>) -> i64 {
    i64::from(ts.year()) * 12 + i64::from(ts.month0())
}

/// First instant of the month with the given index
pub fn month_start(index: i64) -> Option<DateTime<Utc>> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
    let date = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

fn align_down(month: i64, width: i64) -> i64 {
    month - month.rem_euclid(width)
}

fn is_month_start(ts: &DateTime<Utc>) -> bool {
    ts.day() == 1 && ts.num_seconds_from_midnight() == 0 && ts.nanosecond() == 0
}

/// Consecutive, non-overlapping buckets covering `[first commit, cutoff]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketLayout {
    first_month: i64,
    width: i64,
    len: usize,
    cutoff: DateTime<Utc>,
}

impl BucketLayout {
    /// Lay out buckets from the boundary at or before `first_commit` up to `cutoff`.
    ///
    /// The last bucket ends at the cutoff and may be partial. When the cutoff
    /// sits exactly on a boundary no empty trailing bucket is created.
    pub fn covering(
        first_commit: DateTime<Utc>,
        cutoff: DateTime<Utc>,
        width_months: u32,
    ) -> FilterResult<Self> {
        if width_months == 0 {
            return Err(FilterError::InvalidBucketWidth { months: 0 });
        }
        if cutoff < first_commit {
            return Err(FilterError::NonChronologicalCutoff { first_commit, cutoff });
        }

        let overflow = || FilterError::CalendarOverflow { first_commit, cutoff };
        let width = i64::from(width_months);
        let first_month = align_down(month_index(&first_commit), width);
        let cutoff_month = month_index(&cutoff);
        let end_month = if cutoff_month.rem_euclid(width) == 0 && is_month_start(&cutoff) {
            cutoff_month
        } else {
            align_down(cutoff_month, width) + width
        };

        month_start(first_month).ok_or_else(overflow)?;
        month_start(end_month).ok_or_else(overflow)?;
        let len = usize::try_from((end_month - first_month) / width).map_err(|_| overflow())?;

        Ok(Self {
            first_month,
            width,
            len,
            cutoff,
        })
    }

    /// Number of buckets, the partial final one included
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bucket holding `ts`, or None when it lies outside the window
    pub fn bucket_index(&self, ts: &DateTime<Utc>) -> Option<usize> {
        if self.len == 0 || *ts > self.cutoff {
            return None;
        }
        let offset = month_index(ts) - self.first_month;
        if offset < 0 {
            return None;
        }
        let index = usize::try_from(offset / self.width).ok()?;
        // A commit exactly at a boundary cutoff belongs to the last bucket
        Some(index.min(self.len - 1))
    }

    /// Start and nominal (full-width) end of a bucket
    pub fn nominal_bounds(&self, index: usize) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if index >= self.len {
            return None;
        }
        let start_month = self.first_month + i64::try_from(index).ok()? * self.width;
        Some((month_start(start_month)?, month_start(start_month + self.width)?))
    }

    /// Count timestamps per bucket; timestamps outside the window are ignored
    pub fn count<'a, I>(&self, timestamps: I) -> Vec<usize>
    where
        I: IntoIterator<Item = &'a DateTime<Utc>>,
    {
        timestamps
            .into_iter()
            .filter_map(|ts| self.bucket_index(ts))
            .fold(vec![0; self.len], |mut counts, index| {
                counts[index] += 1;
                counts
            })
    }

    /// Materialise buckets from per-bucket counts produced by [`BucketLayout::count`]
    pub fn buckets(&self, counts: &[usize]) -> Vec<ActivityBucket> {
        (0..self.len)
            .filter_map(|index| {
                let (start, nominal_end) = self.nominal_bounds(index)?;
                let end = nominal_end.min(self.cutoff);
                Some(ActivityBucket {
                    start,
                    end,
                    count: counts.get(index).copied().unwrap_or(0),
                    partial: end < nominal_end,
                })
            })
            .collect()
    }
}
