use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use snapkeep_core::{AppError, AppResult};

/// Retention bucket a rotation run operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Hourly snapshots.
    Hour,
    /// Daily snapshots.
    Day,
    /// Weekly snapshots.
    Week,
    /// Monthly snapshots.
    Month,
    /// Yearly snapshots.
    Year,
}

impl Period {
    /// Every known period, shortest first.
    pub const ALL: [Self; 5] = [Self::Hour, Self::Day, Self::Week, Self::Month, Self::Year];

    /// Stable lowercase names accepted on the command line and in events.
    pub const NAMES: [&'static str; 5] = ["hour", "day", "week", "month", "year"];

    /// Returns stable period name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Formats the per-period suffix embedded into snapshot descriptions.
    ///
    /// Hours use `HH:MM`, days the abbreviated weekday, weeks the
    /// zero-padded Sunday-based week number, months the abbreviated month
    /// name and years the four-digit year.
    #[must_use]
    pub fn now_suffix(self, now: &NaiveDateTime) -> String {
        let pattern = match self {
            Self::Hour => "%H:%M",
            Self::Day => "%a",
            Self::Week => "%U",
            Self::Month => "%b",
            Self::Year => "%Y",
        };

        now.format(pattern).to_string()
    }
}

impl Display for Period {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(AppError::Validation(format!(
                "unknown period '{value}', expected one of hour, day, week, month, year"
            ))),
        }
    }
}
