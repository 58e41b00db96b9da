use std::str::FromStr;

use snapkeep_core::{AppError, AppResult};

/// Destination of run summaries, chosen from the configured target string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    /// SNS topic ARN.
    SnsTopic(String),
    /// HTTP(S) endpoint receiving a JSON POST.
    Webhook(String),
}

impl FromStr for NotificationTarget {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        let value = value.trim();

        if value.starts_with("arn:") {
            if !value.contains(":sns:") {
                return Err(AppError::Configuration(format!(
                    "notification target '{value}' is not an SNS topic ARN"
                )));
            }
            return Ok(Self::SnsTopic(value.to_owned()));
        }

        if value.starts_with("https://") || value.starts_with("http://") {
            return Ok(Self::Webhook(value.to_owned()));
        }

        Err(AppError::Configuration(format!(
            "unsupported notification target '{value}', expected an SNS topic ARN or http(s) URL"
        )))
    }
}
