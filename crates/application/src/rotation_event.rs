use serde_json::Value;
use snapkeep_core::{AppError, AppResult};
use snapkeep_domain::Period;

/// Expected shape of an event-style invocation, used in error messages.
pub const ROTATION_EVENT_USAGE: &str = r#"{"period": "{hour|day|week|month|year}"}"#;

/// Extracts the period from an event payload such as `{"period": "day"}`.
///
/// Extra fields are ignored. A payload that is not a JSON object, lacks a
/// string `period` or names an unknown period is rejected.
pub fn parse_rotation_event(payload: &str) -> AppResult<Period> {
    let event = serde_json::from_str::<Value>(payload).map_err(|error| {
        AppError::Validation(format!(
            "event is not valid JSON ({error}), expecting {ROTATION_EVENT_USAGE}"
        ))
    })?;

    let period = event
        .as_object()
        .and_then(|fields| fields.get("period"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::Validation(format!("expecting {ROTATION_EVENT_USAGE} in input event"))
        })?;

    period.parse::<Period>()
}
