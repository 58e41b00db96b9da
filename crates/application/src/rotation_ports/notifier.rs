use async_trait::async_trait;
use snapkeep_core::AppResult;

/// Run summary handed to a notification target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunNotification {
    /// Short subject line.
    pub subject: String,
    /// Multi-line summary body.
    pub message: String,
    /// Whether the run recorded any error.
    pub failed: bool,
}

/// Port for delivering run summaries.
#[async_trait]
pub trait RunNotifier: Send + Sync {
    /// Returns a printable name of the destination for log lines.
    fn target(&self) -> &str;

    /// Delivers one run summary.
    async fn notify(&self, notification: &RunNotification) -> AppResult<()>;
}
