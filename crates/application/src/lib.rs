//! Application services and ports.

#![forbid(unsafe_code)]

mod rotation_event;
mod rotation_ports;
mod rotation_service;
mod run_reporter;
mod run_stats;
mod volume_enumerator;

pub use rotation_event::{ROTATION_EVENT_USAGE, parse_rotation_event};
pub use rotation_ports::{
    RunNotification, RunNotifier, SnapshotProvider, TagType, VolumeSelector,
};
pub use rotation_service::{DEFAULT_VOLUME_COOLDOWN, RotationService, RotationSettings};
pub use run_reporter::{RunExitCode, RunReport, RunReporter};
pub use run_stats::{RunStats, VolumeOutcome};
pub use volume_enumerator::VolumeEnumerator;
