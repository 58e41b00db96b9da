use serde::{Deserialize, Serialize};

use crate::{Period, Snapshot, classify_description};

/// Number of snapshots to keep per period after a rotation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Hourly snapshots kept.
    pub hour: u32,
    /// Daily snapshots kept.
    pub day: u32,
    /// Weekly snapshots kept.
    pub week: u32,
    /// Monthly snapshots kept.
    pub month: u32,
    /// Yearly snapshots kept.
    pub year: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            hour: 4,
            day: 3,
            week: 4,
            month: 3,
            year: 10,
        }
    }
}

impl RetentionPolicy {
    /// Returns retention count for one period.
    #[must_use]
    pub fn keep(&self, period: Period) -> u32 {
        match period {
            Period::Hour => self.hour,
            Period::Day => self.day,
            Period::Week => self.week,
            Period::Month => self.month,
            Period::Year => self.year,
        }
    }

    /// Returns a copy with the retention count of `period` replaced.
    #[must_use]
    pub fn with_keep(mut self, period: Period, keep: u32) -> Self {
        match period {
            Period::Hour => self.hour = keep,
            Period::Day => self.day = keep,
            Period::Week => self.week = keep,
            Period::Month => self.month = keep,
            Period::Year => self.year = keep,
        }
        self
    }
}

/// Selects the snapshots a `period` run deletes so that `keep` remain.
///
/// Candidates are the snapshots classified as `period`, ordered oldest
/// first by start time. The result is the oldest `max(0, candidates - keep)`
/// of them, oldest first. Snapshots of other periods or without a managed
/// description are never selected. Equal start times keep provider order.
#[must_use]
pub fn calc_rotate(snapshots: &[Snapshot], period: Period, keep: u32) -> Vec<Snapshot> {
    let mut candidates: Vec<&Snapshot> = snapshots
        .iter()
        .filter(|snapshot| classify_description(snapshot.description()) == Some(period))
        .collect();
    candidates.sort_by_key(|snapshot| snapshot.start_time());

    let keep = usize::try_from(keep).unwrap_or(usize::MAX);
    let excess = candidates.len().saturating_sub(keep);

    candidates
        .into_iter()
        .take(excess)
        .cloned()
        .collect()
}
