use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use snapkeep_domain::{Period, RetentionPolicy, TIMESTAMP_FORMAT};
use tracing::{error, info};

use crate::rotation_ports::{SnapshotProvider, VolumeSelector};
use crate::run_stats::RunStats;
use crate::volume_enumerator::VolumeEnumerator;

mod volume;


/// Pause observed between two volumes unless configured otherwise.
pub const DEFAULT_VOLUME_COOLDOWN: Duration = Duration::from_secs(3);

/// Behavior knobs of a rotation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationSettings {
    /// Criteria used to find the volumes to rotate.
    pub selector: VolumeSelector,
    /// Snapshots kept per period.
    pub retention: RetentionPolicy,
    /// Skips the create phase.
    pub skip_create: bool,
    /// Skips the delete phase.
    pub skip_delete: bool,
    /// Pause between two volumes, a throttle against provider rate limits.
    pub volume_cooldown: Duration,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            selector: VolumeSelector::default(),
            retention: RetentionPolicy::default(),
            skip_create: false,
            skip_delete: false,
            volume_cooldown: DEFAULT_VOLUME_COOLDOWN,
        }
    }
}

/// Snapshot rotation service: one run per period over every matched volume.
#[derive(Clone)]
pub struct RotationService {
    provider: Arc<dyn SnapshotProvider>,
    enumerator: VolumeEnumerator,
    settings: RotationSettings,
}

impl RotationService {
    /// Creates a rotation service.
    #[must_use]
    pub fn new(provider: Arc<dyn SnapshotProvider>, settings: RotationSettings) -> Self {
        Self {
            enumerator: VolumeEnumerator::new(provider.clone()),
            provider,
            settings,
        }
    }

    /// Rotates `period` snapshots of every matched volume.
    ///
    /// Volumes are processed one after another. Snapshot-level failures are
    /// counted and never stop the run; a failed volume lookup is counted as
    /// a run error and ends the run before any volume is touched.
    pub async fn run(&self, period: Period, invoked_at: NaiveDateTime) -> RunStats {
        let mut stats = RunStats::default();

        info!(
            period = %period,
            started_at = %invoked_at.format(TIMESTAMP_FORMAT),
            keep = self.settings.retention.keep(period),
            "started taking {period} snapshots"
        );

        let volumes = match self.enumerator.enumerate(&self.settings.selector).await {
            Ok(volumes) => volumes,
            Err(error) => {
                stats.record_run_error();
                error!(error = %error, "can't access volume list");
                return stats;
            }
        };

        for (index, volume) in volumes.iter().enumerate() {
            if index > 0 && !self.settings.volume_cooldown.is_zero() {
                tokio::time::sleep(self.settings.volume_cooldown).await;
            }

            let outcome = self.rotate_volume(volume, period, &invoked_at).await;
            stats.record_volume(outcome);
        }

        stats
    }
}
