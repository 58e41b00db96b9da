//! Snapshot description codec.
//!
//! The description is the only state the rotation keeps on the provider side.
//! A run writes
//! `"<period>_snapshot <volume-id>_<period>_<suffix> by snapshot script at <DD-MM-YYYY HH:MM:SS>"`
//! and later classifies snapshots by the leading `"<period>_snapshot"` token
//! alone. Everything after that token is informational.

use chrono::NaiveDateTime;

use crate::Period;

/// Token that follows the period name at the start of every managed description.
pub const DESCRIPTION_MARKER: &str = "_snapshot";

/// Timestamp layout used in descriptions and run summaries.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Builds the description for a snapshot taken by a `period` run.
#[must_use]
pub fn encode_description(period: Period, volume_id: &str, invoked_at: &NaiveDateTime) -> String {
    format!(
        "{period}{DESCRIPTION_MARKER} {volume_id}_{period}_{suffix} by snapshot script at {timestamp}",
        suffix = period.now_suffix(invoked_at),
        timestamp = invoked_at.format(TIMESTAMP_FORMAT),
    )
}

/// Returns the period a description was labeled with, if any.
///
/// Only a strict prefix match counts: the description must start with one
/// of the five period names immediately followed by `_snapshot`.
#[must_use]
pub fn classify_description(description: &str) -> Option<Period> {
    Period::ALL.into_iter().find(|period| {
        description
            .strip_prefix(period.as_str())
            .is_some_and(|rest| rest.starts_with(DESCRIPTION_MARKER))
    })
}
