use chrono::NaiveDateTime;
use snapkeep_domain::{Period, Volume, calc_rotate, encode_description};
use tracing::{error, info, warn};

use crate::run_stats::VolumeOutcome;

use super::RotationService;

impl RotationService {
    /// Runs the create phase and then the delete phase for one volume.
    ///
    /// The delete phase runs whatever the create phase did, and delete
    /// failures never undo a creation.
    pub(super) async fn rotate_volume(
        &self,
        volume: &Volume,
        period: Period,
        invoked_at: &NaiveDateTime,
    ) -> VolumeOutcome {
        let mut outcome = VolumeOutcome::default();
        info!(volume_id = %volume.id(), "processing volume");

        if !self.settings.skip_create {
            self.create_phase(volume, period, invoked_at, &mut outcome)
                .await;
        }

        if !self.settings.skip_delete {
            self.delete_phase(volume, period, &mut outcome).await;
        }

        outcome
    }

    async fn create_phase(
        &self,
        volume: &Volume,
        period: Period,
        invoked_at: &NaiveDateTime,
        outcome: &mut VolumeOutcome,
    ) {
        let description = encode_description(period, volume.id(), invoked_at);
        info!(
            volume_id = %volume.id(),
            description = %description,
            "creating snapshot"
        );

        let snapshot = match self
            .provider
            .create_snapshot(volume.id(), description.as_str())
            .await
        {
            Ok(snapshot) => snapshot,
            Err(error) => {
                outcome.errors = outcome.errors.saturating_add(1);
                error!(volume_id = %volume.id(), error = %error, "error making snapshot");
                return;
            }
        };
        outcome.created = outcome.created.saturating_add(1);

        if volume.tags().is_empty() {
            return;
        }

        if let Err(error) = self
            .provider
            .tag_snapshot(snapshot.id(), volume.tags())
            .await
        {
            warn!(
                volume_id = %volume.id(),
                snapshot_id = %snapshot.id(),
                error = %error,
                "failed to copy volume tags onto snapshot"
            );
        }
    }

    async fn delete_phase(&self, volume: &Volume, period: Period, outcome: &mut VolumeOutcome) {
        let snapshots = match self.provider.list_volume_snapshots(volume.id()).await {
            Ok(snapshots) => snapshots,
            Err(error) => {
                outcome.errors = outcome.errors.saturating_add(1);
                error!(volume_id = %volume.id(), error = %error, "error listing snapshots");
                return;
            }
        };

        let keep = self.settings.retention.keep(period);
        let delete_set = calc_rotate(&snapshots, period, keep);
        info!(
            volume_id = %volume.id(),
            snapshot_count = snapshots.len(),
            keep,
            delete_count = delete_set.len(),
            "computed rotation"
        );

        for snapshot in delete_set {
            info!(
                volume_id = %volume.id(),
                snapshot_id = %snapshot.id(),
                description = %snapshot.description(),
                "deleting snapshot"
            );

            match self.provider.delete_snapshot(snapshot.id()).await {
                Ok(()) => outcome.deleted = outcome.deleted.saturating_add(1),
                Err(error) => {
                    outcome.errors = outcome.errors.saturating_add(1);
                    error!(
                        volume_id = %volume.id(),
                        snapshot_id = %snapshot.id(),
                        error = %error,
                        "error deleting snapshot"
                    );
                }
            }
        }
    }
}
