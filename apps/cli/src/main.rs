//! Snapkeep command line: rotates tagged volume snapshots for one period.

#![forbid(unsafe_code)]

mod cli_config;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use snapkeep_application::{
    RotationService, RunExitCode, RunNotifier, RunReport, RunReporter, parse_rotation_event,
};
use snapkeep_core::AppError;
use snapkeep_domain::Period;
use snapkeep_infrastructure::{
    Ec2SnapshotProvider, NotificationTarget, SnsRunNotifier, WebhookRunNotifier, load_aws_session,
};
use tracing::{error, info, warn};

use crate::cli_config::{LoadedConfig, RotationConfig};
use crate::logging::{init_tracing, open_log_file};

const WEBHOOK_MAX_ATTEMPTS: u8 = 3;
const WEBHOOK_RETRY_BACKOFF_MS: u64 = 500;

#[derive(Debug, Parser)]
#[command(
    name = "snapkeep",
    version,
    about = "Create a labeled snapshot of every tagged volume and prune old ones"
)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Rotation period.
    #[arg(
        value_parser = PossibleValuesParser::new(Period::NAMES)
            .try_map(|value: String| value.parse::<Period>()),
        required_unless_present = "event",
        conflicts_with = "event"
    )]
    period: Option<Period>,

    /// Scheduler event payload such as '{"period": "day"}'.
    #[arg(long)]
    event: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let env_vars = std::env::vars_os().filter_map(|(name, value)| {
        Some((name.into_string().ok()?, value.into_string().ok()?))
    });
    let loaded = RotationConfig::load(cli.config.as_path(), env_vars);

    let log_path = loaded
        .as_ref()
        .ok()
        .and_then(|loaded| loaded.config.log_file.clone());
    let log_file = log_path.as_deref().map(open_log_file);
    let log_file_error = match log_file {
        Some(Ok(file)) => {
            init_tracing(Some(file));
            None
        }
        Some(Err(error)) => {
            init_tracing(None);
            Some(error)
        }
        None => {
            init_tracing(None);
            None
        }
    };

    if let (Some(path), Some(error)) = (log_path.as_deref(), log_file_error) {
        warn!(
            log_file = %path.display(),
            error = %error,
            "can't open log file, logging to console only"
        );
    }

    let loaded = match loaded {
        Ok(loaded) => loaded,
        Err(failure) => {
            failure.log();
            return exit_code(RunExitCode::InvalidInput);
        }
    };
    loaded.log_notes();

    let period = match resolve_period(cli.period, cli.event.as_deref()) {
        Ok(period) => period,
        Err(error) => {
            error!(error = %error, "invalid rotation request");
            return exit_code(RunExitCode::InvalidInput);
        }
    };

    let report = run(period, &loaded).await;
    exit_code(report.exit_code)
}

fn resolve_period(period: Option<Period>, event: Option<&str>) -> Result<Period, AppError> {
    match (period, event) {
        (Some(period), _) => Ok(period),
        (None, Some(event)) => parse_rotation_event(event),
        (None, None) => Err(AppError::Validation(
            "a period argument or --event payload is required".to_owned(),
        )),
    }
}

async fn run(period: Period, loaded: &LoadedConfig) -> RunReport {
    let config = &loaded.config;
    let sdk_config = load_aws_session(
        config.region_name.as_deref(),
        config.aws_profile_name.as_deref(),
    )
    .await;

    let settings = config.rotation_settings();
    info!(
        period = %period,
        tag_name = %settings.selector.tag.key,
        tag_value = %settings.selector.tag.value,
        tag_type = settings.selector.tag_type.as_str(),
        keep = settings.retention.keep(period),
        skip_create = settings.skip_create,
        skip_delete = settings.skip_delete,
        "snapkeep started"
    );

    let provider = Arc::new(Ec2SnapshotProvider::new(&sdk_config));
    let service = RotationService::new(provider, settings);

    let mut reporter = RunReporter::new();
    if let Some(notifier) = build_notifier(config, &sdk_config) {
        reporter = reporter.with_notifier(notifier);
    }

    let stats = service.run(period, Local::now().naive_local()).await;
    reporter.report(&stats, &Local::now().naive_local()).await
}

fn build_notifier(
    config: &RotationConfig,
    sdk_config: &aws_config::SdkConfig,
) -> Option<Arc<dyn RunNotifier>> {
    let target = config.notification_target.as_deref()?;

    match target.parse::<NotificationTarget>() {
        Ok(NotificationTarget::SnsTopic(topic_arn)) => {
            Some(Arc::new(SnsRunNotifier::new(sdk_config, topic_arn)))
        }
        Ok(NotificationTarget::Webhook(endpoint)) => {
            let http_client = match reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))
            {
                Ok(client) => client,
                Err(error) => {
                    warn!(error = %error, "notifications disabled");
                    return None;
                }
            };

            Some(Arc::new(WebhookRunNotifier::new(
                http_client,
                endpoint,
                WEBHOOK_MAX_ATTEMPTS,
                WEBHOOK_RETRY_BACKOFF_MS,
            )))
        }
        Err(error) => {
            warn!(error = %error, "notifications disabled");
            None
        }
    }
}

fn exit_code(code: RunExitCode) -> ExitCode {
    ExitCode::from(code.code())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use snapkeep_domain::Period;

    use super::{Cli, resolve_period};

    #[test]
    fn parses_period_argument() {
        let cli = Cli::try_parse_from(["snapkeep", "week"]).unwrap_or_else(|_| unreachable!());

        assert_eq!(cli.period, Some(Period::Week));
        assert_eq!(cli.config.to_str(), Some("config.json"));
    }

    #[test]
    fn rejects_unknown_period_and_missing_arguments() {
        assert!(Cli::try_parse_from(["snapkeep", "fortnight"]).is_err());
        assert!(Cli::try_parse_from(["snapkeep"]).is_err());
        assert!(
            Cli::try_parse_from(["snapkeep", "day", "--event", r#"{"period":"day"}"#]).is_err()
        );
    }

    #[test]
    fn event_payload_selects_period() {
        let cli = Cli::try_parse_from([
            "snapkeep",
            "--config",
            "/etc/snapkeep.json",
            "--event",
            r#"{"period": "month"}"#,
        ])
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            resolve_period(cli.period, cli.event.as_deref()).ok(),
            Some(Period::Month)
        );
        assert!(resolve_period(None, Some(r#"{"period": "decade"}"#)).is_err());
        assert!(resolve_period(None, Some("{}")).is_err());
    }
}
