use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::{PackratError, Result};

/// Filename prefix every archive in the backup store carries.
pub const ARCHIVE_PREFIX: &str = "backup_";

/// Byte offset and length of the `YYYYMMDD` substring in an archive filename
/// (immediately after the prefix).
const DATE_OFFSET: usize = 7;
const DATE_LEN: usize = 8;

/// Retention category. Every store entry belongs to exactly one bucket, and
/// each bucket keeps at most one archive after rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Yearly,
    Monthly,
    Weekly,
    Daily,
}

impl Bucket {
    /// Classify a creation date. First matching rule wins: a January 1st
    /// that falls on a Monday is yearly, never weekly.
    pub fn classify(date: NaiveDate) -> Bucket {
        if date.ordinal() == 1 {
            Bucket::Yearly
        } else if date.day() == 1 {
            Bucket::Monthly
        } else if date.weekday() == Weekday::Mon {
            Bucket::Weekly
        } else {
            Bucket::Daily
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Yearly => "yearly",
            Bucket::Monthly => "monthly",
            Bucket::Weekly => "weekly",
            Bucket::Daily => "daily",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One archive file currently in the backup store.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    pub name: String,
    pub date: NaiveDate,
}

impl StoreEntry {
    /// Build an entry from a store filename. Fails on any non-conforming name.
    pub fn parse(name: &str) -> Result<StoreEntry> {
        Ok(StoreEntry {
            name: name.to_string(),
            date: parse_archive_date(name)?,
        })
    }
}

/// Extract the creation date embedded in an archive filename.
///
/// The naming contract is fixed-offset: `backup_YYYYMMDD-HHMMSS.zip` carries
/// its date at bytes 7..15. A wrong prefix, a short name, non-digit bytes,
/// or an impossible calendar date are all parse failures, and a single parse
/// failure aborts the whole retention run.
pub fn parse_archive_date(name: &str) -> Result<NaiveDate> {
    let malformed = |reason: String| PackratError::RetentionParse {
        name: name.to_string(),
        reason,
    };

    if !name.starts_with(ARCHIVE_PREFIX) {
        return Err(malformed(format!("missing '{ARCHIVE_PREFIX}' prefix")));
    }
    let digits = name
        .get(DATE_OFFSET..DATE_OFFSET + DATE_LEN)
        .ok_or_else(|| malformed("name is too short to carry a date".into()))?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(format!(
            "expected {DATE_LEN} digits at offset {DATE_OFFSET}, found '{digits}'"
        )));
    }
    NaiveDate::parse_from_str(digits, "%Y%m%d")
        .map_err(|_| malformed(format!("'{digits}' is not a calendar date")))
}

/// What rotation decided for a single store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDecision {
    /// Newest member of its bucket; survives this rotation.
    Keep,
    Delete,
}

/// A store entry together with its bucket and rotation decision.
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub name: String,
    pub date: NaiveDate,
    pub bucket: Bucket,
    pub decision: RotateDecision,
}

/// Full rotation plan over the backup store, newest entries first.
#[derive(Debug, Clone, Default)]
pub struct RotationPlan {
    pub entries: Vec<PlanEntry>,
}

impl RotationPlan {
    pub fn deletions(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|e| e.decision == RotateDecision::Delete)
    }

    pub fn kept(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|e| e.decision == RotateDecision::Keep)
    }
}

/// Partition store entries into buckets and mark everything but the newest
/// member of each bucket for deletion.
///
/// Entries are ordered descending by (date, name); the name comparison
/// breaks same-day ties and, with the timestamp suffix in the filename,
/// equals descending time-of-day order. The first entry seen per bucket is
/// the keeper. Buckets with zero or one member produce no deletions, so
/// planning over the survivors of a previous rotation is a no-op.
pub fn plan(entries: &[StoreEntry]) -> RotationPlan {
    let mut indices: Vec<usize> = (0..entries.len()).collect();
    indices.sort_by(|&a, &b| {
        (entries[b].date, entries[b].name.as_str()).cmp(&(entries[a].date, entries[a].name.as_str()))
    });

    let mut seen_buckets: HashSet<Bucket> = HashSet::new();
    let plan_entries = indices
        .into_iter()
        .map(|idx| {
            let bucket = Bucket::classify(entries[idx].date);
            let decision = if seen_buckets.insert(bucket) {
                RotateDecision::Keep
            } else {
                RotateDecision::Delete
            };
            PlanEntry {
                name: entries[idx].name.clone(),
                date: entries[idx].date,
                bucket,
                decision,
            }
        })
        .collect();

    RotationPlan {
        entries: plan_entries,
    }
}
