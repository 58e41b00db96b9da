use async_trait::async_trait;
use snapkeep_core::AppResult;
use snapkeep_domain::{ResourceTag, Snapshot, Volume};

/// Port for the block-storage provider that owns volumes and snapshots.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Lists volumes carrying the given tag.
    async fn find_volumes_by_tag(&self, tag: &ResourceTag) -> AppResult<Vec<Volume>>;

    /// Lists identifiers of compute instances carrying the given tag.
    ///
    /// With `running_only`, instances in any other state are left out.
    async fn find_instance_ids_by_tag(
        &self,
        tag: &ResourceTag,
        running_only: bool,
    ) -> AppResult<Vec<String>>;

    /// Lists volumes attached to any of the given instances.
    async fn find_volumes_attached_to(&self, instance_ids: &[String]) -> AppResult<Vec<Volume>>;

    /// Starts a snapshot of one volume with the given description.
    async fn create_snapshot(&self, volume_id: &str, description: &str) -> AppResult<Snapshot>;

    /// Sets tags on an existing snapshot.
    async fn tag_snapshot(&self, snapshot_id: &str, tags: &[ResourceTag]) -> AppResult<()>;

    /// Lists every snapshot taken from one volume, in no particular order.
    async fn list_volume_snapshots(&self, volume_id: &str) -> AppResult<Vec<Snapshot>>;

    /// Deletes one snapshot.
    async fn delete_snapshot(&self, snapshot_id: &str) -> AppResult<()>;
}
