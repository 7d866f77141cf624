//! Contributor timezone correction
//!
//! Many imported or misconfigured commits carry a +0000 offset that does not
//! reflect where the author worked. Each contributor's best timezone is the
//! offset of their oldest commit that is not +0000; contributors who never
//! recorded another offset have no best timezone and are left out of the
//! distributions.
//!
//! That oldest non-+0000 commit also activates the contributor: commits they
//! made before it are not trusted for hour counts or cleaned sampling.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::git::CommitRecord;

/// Best-known offset per contributor (author email)
#[derive(Debug, Clone, Default)]
pub struct ContributorTimezones {
    /// Oldest commit outside +0000, in its recorded offset
    first_local: HashMap<String, DateTime<FixedOffset>>,
}

impl ContributorTimezones {
    pub fn from_records(records: &[CommitRecord]) -> Self {
        let oldest: HashMap<&str, DateTime<FixedOffset>> = records
            .iter()
            .filter(|r| !r.is_utc_zero())
            .fold(HashMap::new(), |mut oldest, record| {
                oldest
                    .entry(record.author_email.as_str())
                    .and_modify(|current| {
                        if record.authored < *current {
                            *current = record.authored;
                        }
                    })
                    .or_insert(record.authored);
                oldest
            });

        Self {
            first_local: oldest
                .into_iter()
                .map(|(email, authored)| (email.to_string(), authored))
                .collect(),
        }
    }

    pub fn best_offset(&self, author_email: &str) -> Option<FixedOffset> {
        self.first_local.get(author_email).map(|first| *first.offset())
    }

    /// True when the contributor has at least one commit outside +0000
    pub fn is_reliable(&self, author_email: &str) -> bool {
        self.first_local.contains_key(author_email)
    }

    /// Instant of the contributor's oldest commit outside +0000
    pub fn activated_at(&self, author_email: &str) -> Option<DateTime<Utc>> {
        self.first_local
            .get(author_email)
            .map(|first| first.with_timezone(&Utc))
    }

    /// True when the commit is at or after its contributor's activation
    pub fn is_activated(&self, record: &CommitRecord) -> bool {
        self.activated_at(&record.author_email)
            .map_or(false, |activated| record.utc() >= activated)
    }

    /// Commit time shifted into the contributor's best timezone.
    ///
    /// The instant is preserved; only the offset used to read it changes.
    pub fn corrected(&self, record: &CommitRecord) -> Option<DateTime<FixedOffset>> {
        let offset = self.best_offset(&record.author_email)?;
        Some(record.authored.with_timezone(&offset))
    }

    /// UTC timestamps of activated commits only
    pub fn cleaned_timestamps(&self, records: &[CommitRecord]) -> Vec<DateTime<Utc>> {
        records
            .iter()
            .filter(|r| self.is_activated(r))
            .map(CommitRecord::utc)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.first_local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_local.is_empty()
    }
}

/// Timestamps left after dropping UTC-only contributors and pre-activation commits
pub fn cleaned_timestamps(records: &[CommitRecord]) -> Vec<DateTime<Utc>> {
    ContributorTimezones::from_records(records).cleaned_timestamps(records)
}

/// Offset in git's `+HHMM` form
pub fn format_offset(offset: &FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
}

/// Commit counts per timezone label (`+HHMM`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimezoneTally {
    counts: BTreeMap<String, u64>,
}

impl TimezoneTally {
    /// Count a repository's commits authored in `[start_year, end_year]`.
    ///
    /// A +0000 commit from a contributor with a best timezone is counted in
    /// that timezone; every other commit keeps its recorded offset.
    pub fn from_records(records: &[CommitRecord], start_year: i32, end_year: i32) -> Self {
        let zones = ContributorTimezones::from_records(records);

        records
            .iter()
            .filter(|r| (start_year..=end_year).contains(&r.authored.year()))
            .fold(Self::default(), |mut tally, record| {
                let offset = match zones.best_offset(&record.author_email) {
                    Some(best) if record.is_utc_zero() => best,
                    _ => *record.authored.offset(),
                };
                tally.record(&format_offset(&offset));
                tally
            })
    }

    pub fn record(&mut self, label: &str) {
        *self.counts.entry(label.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Label with the most commits; ties go to the label that sorts first
    pub fn most_common(&self) -> Option<(&str, u64)> {
        self.counts
            .iter()
            .fold(None, |best, (label, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((label.as_str(), count)),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(label, &count)| (label.as_str(), count))
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
