use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use snapkeep_application::{DEFAULT_VOLUME_COOLDOWN, RotationSettings, TagType, VolumeSelector};
use snapkeep_core::AppError;
use snapkeep_domain::{ResourceTag, RetentionPolicy};
use tracing::{debug, error, warn};

/// Prefix of environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "snapkeep_";

/// Typed rotation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub aws_profile_name: Option<String>,
    #[serde(alias = "ec2_region_name")]
    pub region_name: Option<String>,
    pub tag_name: String,
    pub tag_value: String,
    #[serde(skip)]
    pub tag_type: TagType,
    /// Raw `tag_type` from the file or environment, converted on resolve.
    #[serde(rename = "tag_type")]
    tag_type_name: Option<String>,
    pub running_only: bool,
    pub keep_hour: u32,
    pub keep_day: u32,
    pub keep_week: u32,
    pub keep_month: u32,
    pub keep_year: u32,
    pub skip_create: bool,
    pub skip_delete: bool,
    pub log_file: Option<PathBuf>,
    #[serde(alias = "arn")]
    pub notification_target: Option<String>,
    pub cooldown_seconds: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        let retention = RetentionPolicy::default();
        Self {
            aws_profile_name: None,
            region_name: None,
            tag_name: "MakeSnapshot".to_owned(),
            tag_value: "true".to_owned(),
            tag_type: TagType::default(),
            tag_type_name: None,
            running_only: false,
            keep_hour: retention.hour,
            keep_day: retention.day,
            keep_week: retention.week,
            keep_month: retention.month,
            keep_year: retention.year,
            skip_create: false,
            skip_delete: false,
            log_file: None,
            notification_target: None,
            cooldown_seconds: DEFAULT_VOLUME_COOLDOWN.as_secs(),
        }
    }
}

/// Severity of a message produced while resolving configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigNoteLevel {
    Debug,
    Warn,
}

/// Message produced while resolving configuration.
pub type ConfigNote = (ConfigNoteLevel, String);

/// Configuration together with the messages produced while resolving it.
///
/// Messages are kept until logging is set up, which itself depends on the
/// resolved `log_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: RotationConfig,
    pub notes: Vec<ConfigNote>,
}

impl LoadedConfig {
    pub fn log_notes(&self) {
        log_notes(&self.notes);
    }
}

/// Configuration that could not be resolved, with every message produced
/// on the way.
#[derive(Debug)]
pub struct ConfigFailure {
    pub error: AppError,
    pub notes: Vec<ConfigNote>,
}

impl ConfigFailure {
    pub fn log(&self) {
        log_notes(&self.notes);
        error!(error = %self.error, "invalid configuration");
    }
}

fn log_notes(notes: &[ConfigNote]) {
    for (level, message) in notes {
        match level {
            ConfigNoteLevel::Debug => debug!("{message}"),
            ConfigNoteLevel::Warn => warn!("{message}"),
        }
    }
}

impl RotationConfig {
    /// Resolves defaults, the config file at `path` and environment overrides.
    pub fn load(
        path: &Path,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Result<LoadedConfig, ConfigFailure> {
        let mut notes = Vec::new();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                notes.push((
                    ConfigNoteLevel::Debug,
                    format!("no config file at '{}', using defaults", path.display()),
                ));
                None
            }
            Err(error) => {
                notes.push((
                    ConfigNoteLevel::Warn,
                    format!(
                        "can't read config file '{}': {error}, using defaults",
                        path.display()
                    ),
                ));
                None
            }
        };

        match Self::resolve(contents.as_deref(), env) {
            Ok(mut loaded) => {
                notes.append(&mut loaded.notes);
                loaded.notes = notes;
                Ok(loaded)
            }
            Err(mut failure) => {
                notes.append(&mut failure.notes);
                failure.notes = notes;
                Err(failure)
            }
        }
    }

    /// Resolves configuration from config file contents and environment pairs.
    ///
    /// A malformed file falls back to defaults with a warning. Environment
    /// values that do not parse as their option's type are all reported in
    /// one configuration error.
    pub fn resolve(
        file_contents: Option<&str>,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Result<LoadedConfig, ConfigFailure> {
        let mut notes = Vec::new();
        let mut invalid = Vec::new();

        let mut config = match file_contents {
            Some(contents) => match serde_json::from_str::<Self>(contents) {
                Ok(config) => config,
                Err(error) => {
                    notes.push((
                        ConfigNoteLevel::Warn,
                        format!("error parsing config ({error}), using defaults"),
                    ));
                    Self::default()
                }
            },
            None => Self::default(),
        };

        for (name, value) in env {
            let name = name.to_ascii_lowercase();
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match config.apply_override(key, value.as_str()) {
                Ok(true) => {}
                Ok(false) => notes.push((
                    ConfigNoteLevel::Warn,
                    format!("unknown parameter (env): {key}"),
                )),
                Err(message) => invalid.push(message),
            }
        }

        if !invalid.is_empty() {
            return Err(ConfigFailure {
                error: AppError::Configuration(invalid.join("; ")),
                notes,
            });
        }

        config.aws_profile_name = config.aws_profile_name.and_then(non_empty);
        config.region_name = config.region_name.and_then(non_empty);
        config.notification_target = config.notification_target.and_then(non_empty);
        config.log_file = config
            .log_file
            .filter(|path| !path.as_os_str().is_empty());

        if let Some(name) = config.tag_type_name.take() {
            config.tag_type = match name.trim().parse::<TagType>() {
                Ok(tag_type) => tag_type,
                Err(error) => {
                    notes.push((
                        ConfigNoteLevel::Warn,
                        format!("{error}, resorting to default"),
                    ));
                    TagType::default()
                }
            };
        }

        Ok(LoadedConfig { config, notes })
    }

    /// Returns the rotation service settings described by this configuration.
    #[must_use]
    pub fn rotation_settings(&self) -> RotationSettings {
        RotationSettings {
            selector: VolumeSelector {
                tag: ResourceTag::new(self.tag_name.as_str(), self.tag_value.as_str()),
                tag_type: self.tag_type,
                running_only: self.running_only,
            },
            retention: RetentionPolicy {
                hour: self.keep_hour,
                day: self.keep_day,
                week: self.keep_week,
                month: self.keep_month,
                year: self.keep_year,
            },
            skip_create: self.skip_create,
            skip_delete: self.skip_delete,
            volume_cooldown: Duration::from_secs(self.cooldown_seconds),
        }
    }

    /// Applies one environment override; returns false for unknown keys.
    fn apply_override(&mut self, key: &str, value: &str) -> Result<bool, String> {
        match key {
            "aws_profile_name" => self.aws_profile_name = Some(value.to_owned()),
            "region_name" | "ec2_region_name" => self.region_name = Some(value.to_owned()),
            "tag_name" => self.tag_name = value.to_owned(),
            "tag_value" => self.tag_value = value.to_owned(),
            "tag_type" => self.tag_type_name = Some(value.to_owned()),
            "running_only" => self.running_only = parse_bool(key, value)?,
            "keep_hour" => self.keep_hour = parse_number(key, value)?,
            "keep_day" => self.keep_day = parse_number(key, value)?,
            "keep_week" => self.keep_week = parse_number(key, value)?,
            "keep_month" => self.keep_month = parse_number(key, value)?,
            "keep_year" => self.keep_year = parse_number(key, value)?,
            "skip_create" => self.skip_create = parse_bool(key, value)?,
            "skip_delete" => self.skip_delete = parse_bool(key, value)?,
            "log_file" => self.log_file = Some(PathBuf::from(value)),
            "notification_target" | "arn" => self.notification_target = Some(value.to_owned()),
            "cooldown_seconds" => self.cooldown_seconds = parse_number(key, value)?,
            _ => return Ok(false),
        }

        Ok(true)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(format!(
            "invalid {}{key} value '{value}': expected a boolean",
            ENV_PREFIX.to_ascii_uppercase()
        )),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|error| {
        format!(
            "invalid {}{key} value '{value}': {error}",
            ENV_PREFIX.to_ascii_uppercase()
        )
    })
}
