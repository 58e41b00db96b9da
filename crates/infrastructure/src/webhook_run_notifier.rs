use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use snapkeep_application::{RunNotification, RunNotifier};
use snapkeep_core::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    message: &'a str,
    status: &'static str,
}

/// Posts run summaries as JSON to an HTTP endpoint.
pub struct WebhookRunNotifier {
    http_client: reqwest::Client,
    endpoint: String,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

impl WebhookRunNotifier {
    /// Creates a webhook notifier.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        endpoint: impl Into<String>,
        max_attempts: u8,
        retry_backoff_ms: u64,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            max_attempts: max_attempts.max(1),
            retry_backoff_ms: retry_backoff_ms.max(50),
        }
    }
}

#[async_trait]
impl RunNotifier for WebhookRunNotifier {
    fn target(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn notify(&self, notification: &RunNotification) -> AppResult<()> {
        let payload = WebhookPayload {
            subject: notification.subject.as_str(),
            message: notification.message.as_str(),
            status: if notification.failed { "error" } else { "ok" },
        };

        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < self.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = self
                .http_client
                .post(self.endpoint.as_str())
                .json(&payload)
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    last_error = Some(format!(
                        "transient HTTP status {} from '{}'",
                        response.status(),
                        self.endpoint
                    ));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
                    return Err(AppError::Notification(format!(
                        "webhook '{}' rejected run summary with status {status}: {body}",
                        self.endpoint
                    )));
                }
                Err(error) => {
                    last_error = Some(format!("webhook transport error: {error}"));
                }
            }

            if attempt < self.max_attempts {
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Notification(last_error.unwrap_or_else(|| {
            "webhook delivery exhausted retries".to_owned()
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::{WebhookPayload, WebhookRunNotifier};

    #[test]
    fn payload_serializes_status() {
        let payload = WebhookPayload {
            subject: "Error making snapshots",
            message: "Created: 0, deleted: 0, errors: 1",
            status: "error",
        };

        assert_eq!(
            serde_json::to_value(&payload).ok(),
            Some(serde_json::json!({
                "subject": "Error making snapshots",
                "message": "Created: 0, deleted: 0, errors: 1",
                "status": "error",
            }))
        );
    }

    #[test]
    fn retry_settings_are_clamped() {
        let notifier = WebhookRunNotifier::new(reqwest::Client::new(), "http://hooks.local", 0, 0);

        assert_eq!(notifier.max_attempts, 1);
        assert_eq!(notifier.retry_backoff_ms, 50);
    }
}
