use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::Client;
use aws_sdk_sns::error::DisplayErrorContext;
use snapkeep_application::{RunNotification, RunNotifier};
use snapkeep_core::{AppError, AppResult};

/// Publishes run summaries to an SNS topic.
#[derive(Clone)]
pub struct SnsRunNotifier {
    client: Client,
    topic_arn: String,
}

impl SnsRunNotifier {
    /// Creates a notifier for one topic.
    #[must_use]
    pub fn new(config: &SdkConfig, topic_arn: impl Into<String>) -> Self {
        Self {
            client: Client::new(config),
            topic_arn: topic_arn.into(),
        }
    }
}

#[async_trait]
impl RunNotifier for SnsRunNotifier {
    fn target(&self) -> &str {
        self.topic_arn.as_str()
    }

    async fn notify(&self, notification: &RunNotification) -> AppResult<()> {
        self.client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(&notification.subject)
            .message(&notification.message)
            .send()
            .await
            .map_err(|error| {
                AppError::Notification(format!(
                    "SNS publish to '{}' failed: {}",
                    self.topic_arn,
                    DisplayErrorContext(&error)
                ))
            })?;

        Ok(())
    }
}
