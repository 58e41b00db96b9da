use std::sync::Arc;

use chrono::NaiveDateTime;
use snapkeep_domain::TIMESTAMP_FORMAT;
use tracing::{error, info};

use crate::rotation_ports::{RunNotification, RunNotifier};
use crate::run_stats::RunStats;

/// Process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExitCode {
    /// Every operation succeeded.
    Success,
    /// Bad period, event payload or configuration; nothing was attempted.
    InvalidInput,
    /// The run finished with one or more errors.
    RotationFailed,
    /// The summary could not be delivered to the notification target.
    NotificationFailed,
}

impl RunExitCode {
    /// Returns the numeric process exit code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::InvalidInput => 1,
            Self::RotationFailed => 3,
            Self::NotificationFailed => 4,
        }
    }
}

/// Summary of one finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Statistics the report was built from.
    pub stats: RunStats,
    /// Exit status of the run.
    pub exit_code: RunExitCode,
    /// Notification subject line.
    pub subject: String,
    /// Human-readable summary lines.
    pub lines: Vec<String>,
}

impl RunReport {
    /// Returns summary lines joined into one message.
    #[must_use]
    pub fn message(&self) -> String {
        self.lines.join("\n")
    }
}

/// Turns run statistics into a logged summary and an optional notification.
#[derive(Clone, Default)]
pub struct RunReporter {
    notifier: Option<Arc<dyn RunNotifier>>,
}

impl RunReporter {
    /// Creates a reporter that only logs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds delivery of every summary through `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn RunNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Builds the summary of a run without side effects.
    #[must_use]
    pub fn summarize(stats: &RunStats, finished_at: &NaiveDateTime) -> RunReport {
        let errors = stats.error_count();
        let (exit_code, subject) = if stats.is_success() {
            (RunExitCode::Success, "Completed making snapshots")
        } else {
            (RunExitCode::RotationFailed, "Error making snapshots")
        };

        RunReport {
            stats: *stats,
            exit_code,
            subject: subject.to_owned(),
            lines: vec![
                format!(
                    "Finished making snapshots at {} for {} volume(s), {errors} errors",
                    finished_at.format(TIMESTAMP_FORMAT),
                    stats.total_vols
                ),
                format!(
                    "Created: {}, deleted: {}, errors: {}",
                    stats.snap_creates, stats.snap_deletes, stats.snap_errors
                ),
            ],
        }
    }

    /// Logs the run summary and delivers it to the notifier, if any.
    ///
    /// A delivery failure turns the exit code into
    /// [`RunExitCode::NotificationFailed`]; the statistics and lines of the
    /// report stay untouched.
    pub async fn report(&self, stats: &RunStats, finished_at: &NaiveDateTime) -> RunReport {
        let mut report = Self::summarize(stats, finished_at);

        for line in &report.lines {
            if stats.is_success() {
                info!("{line}");
            } else {
                error!("{line}");
            }
        }

        let Some(notifier) = &self.notifier else {
            return report;
        };

        info!(notification_target = notifier.target(), "sending run summary notification");
        let notification = RunNotification {
            subject: report.subject.clone(),
            message: report.message(),
            failed: !stats.is_success(),
        };

        if let Err(error) = notifier.notify(&notification).await {
            error!(
                notification_target = notifier.target(),
                error = %error,
                rotation_exit_code = report.exit_code.code(),
                "can't deliver run summary notification"
            );
            report.exit_code = RunExitCode::NotificationFailed;
        }

        report
    }
}
