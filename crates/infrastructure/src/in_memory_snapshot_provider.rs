use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use snapkeep_application::SnapshotProvider;
use snapkeep_core::{AppError, AppResult};
use snapkeep_domain::{ResourceTag, Snapshot, Volume};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredInstance {
    id: String,
    tags: Vec<ResourceTag>,
    running: bool,
    volume_ids: Vec<String>,
}

#[derive(Debug, Clone)]
struct StoredSnapshot {
    snapshot: Snapshot,
    tags: Vec<ResourceTag>,
}

#[derive(Debug, Default)]
struct ProviderState {
    volumes: Vec<Volume>,
    instances: Vec<StoredInstance>,
    snapshots: Vec<StoredSnapshot>,
    last_start_time: Option<DateTime<Utc>>,
    unreachable: bool,
    failing_creates: HashSet<String>,
    failing_deletes: HashSet<String>,
}

impl ProviderState {
    fn ensure_reachable(&self) -> AppResult<()> {
        if self.unreachable {
            return Err(AppError::Provider(
                "in-memory provider is marked unreachable".to_owned(),
            ));
        }

        Ok(())
    }

    /// Returns a start time strictly after every snapshot created so far.
    fn next_start_time(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let start_time = match self.last_start_time {
            Some(last) if last >= now => last + TimeDelta::milliseconds(1),
            _ => now,
        };
        self.last_start_time = Some(start_time);
        start_time
    }
}

/// Process-local snapshot provider with failure injection.
#[derive(Debug, Default)]
pub struct InMemorySnapshotProvider {
    state: RwLock<ProviderState>,
}

impl InMemorySnapshotProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a volume.
    #[must_use]
    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.state.get_mut().volumes.push(volume);
        self
    }

    /// Adds an instance with the volumes attached to it.
    #[must_use]
    pub fn with_instance(
        mut self,
        id: impl Into<String>,
        tags: Vec<ResourceTag>,
        running: bool,
        volume_ids: &[&str],
    ) -> Self {
        self.state.get_mut().instances.push(StoredInstance {
            id: id.into(),
            tags,
            running,
            volume_ids: volume_ids.iter().map(|id| (*id).to_owned()).collect(),
        });
        self
    }

    /// Adds an existing snapshot.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        let state = self.state.get_mut();
        if state
            .last_start_time
            .is_none_or(|last| last < snapshot.start_time())
        {
            state.last_start_time = Some(snapshot.start_time());
        }
        state.snapshots.push(StoredSnapshot {
            snapshot,
            tags: Vec::new(),
        });
        self
    }

    /// Makes every call fail, as an unreachable endpoint would.
    pub async fn set_unreachable(&self, unreachable: bool) {
        self.state.write().await.unreachable = unreachable;
    }

    /// Makes snapshot creation fail for one volume.
    pub async fn fail_creates_for(&self, volume_id: &str) {
        self.state
            .write()
            .await
            .failing_creates
            .insert(volume_id.to_owned());
    }

    /// Makes deletion fail for one snapshot.
    pub async fn fail_deletes_for(&self, snapshot_id: &str) {
        self.state
            .write()
            .await
            .failing_deletes
            .insert(snapshot_id.to_owned());
    }

    /// Returns the snapshots of one volume, oldest first.
    pub async fn snapshots_of(&self, volume_id: &str) -> Vec<Snapshot> {
        let mut snapshots: Vec<Snapshot> = self
            .state
            .read()
            .await
            .snapshots
            .iter()
            .filter(|stored| stored.snapshot.volume_id() == volume_id)
            .map(|stored| stored.snapshot.clone())
            .collect();
        snapshots.sort_by_key(Snapshot::start_time);
        snapshots
    }

    /// Returns tags set on one snapshot.
    pub async fn snapshot_tags(&self, snapshot_id: &str) -> Vec<ResourceTag> {
        self.state
            .read()
            .await
            .snapshots
            .iter()
            .find(|stored| stored.snapshot.id() == snapshot_id)
            .map(|stored| stored.tags.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SnapshotProvider for InMemorySnapshotProvider {
    async fn find_volumes_by_tag(&self, tag: &ResourceTag) -> AppResult<Vec<Volume>> {
        let state = self.state.read().await;
        state.ensure_reachable()?;

        Ok(state
            .volumes
            .iter()
            .filter(|volume| volume.has_tag(&tag.key, &tag.value))
            .cloned()
            .collect())
    }

    async fn find_instance_ids_by_tag(
        &self,
        tag: &ResourceTag,
        running_only: bool,
    ) -> AppResult<Vec<String>> {
        let state = self.state.read().await;
        state.ensure_reachable()?;

        Ok(state
            .instances
            .iter()
            .filter(|instance| instance.tags.contains(tag))
            .filter(|instance| instance.running || !running_only)
            .map(|instance| instance.id.clone())
            .collect())
    }

    async fn find_volumes_attached_to(&self, instance_ids: &[String]) -> AppResult<Vec<Volume>> {
        let state = self.state.read().await;
        state.ensure_reachable()?;

        let attached: HashSet<&str> = state
            .instances
            .iter()
            .filter(|instance| instance_ids.contains(&instance.id))
            .flat_map(|instance| instance.volume_ids.iter().map(String::as_str))
            .collect();

        Ok(state
            .volumes
            .iter()
            .filter(|volume| attached.contains(volume.id()))
            .cloned()
            .collect())
    }

    async fn create_snapshot(&self, volume_id: &str, description: &str) -> AppResult<Snapshot> {
        let mut state = self.state.write().await;
        state.ensure_reachable()?;

        if state.failing_creates.contains(volume_id) {
            return Err(AppError::Provider(format!(
                "snapshot creation refused for volume '{volume_id}'"
            )));
        }

        if !state.volumes.iter().any(|volume| volume.id() == volume_id) {
            return Err(AppError::Provider(format!(
                "volume '{volume_id}' does not exist"
            )));
        }

        let start_time = state.next_start_time();
        let snapshot = Snapshot::new(
            format!("snap-{}", Uuid::new_v4().simple()),
            volume_id,
            description,
            start_time,
        )?;
        state.snapshots.push(StoredSnapshot {
            snapshot: snapshot.clone(),
            tags: Vec::new(),
        });

        Ok(snapshot)
    }

    async fn tag_snapshot(&self, snapshot_id: &str, tags: &[ResourceTag]) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.ensure_reachable()?;

        let stored = state
            .snapshots
            .iter_mut()
            .find(|stored| stored.snapshot.id() == snapshot_id)
            .ok_or_else(|| {
                AppError::Provider(format!("snapshot '{snapshot_id}' does not exist"))
            })?;

        for tag in tags {
            stored.tags.retain(|existing| existing.key != tag.key);
            stored.tags.push(tag.clone());
        }

        Ok(())
    }

    async fn list_volume_snapshots(&self, volume_id: &str) -> AppResult<Vec<Snapshot>> {
        let state = self.state.read().await;
        state.ensure_reachable()?;

        Ok(state
            .snapshots
            .iter()
            .filter(|stored| stored.snapshot.volume_id() == volume_id)
            .map(|stored| stored.snapshot.clone())
            .collect())
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.ensure_reachable()?;

        if state.failing_deletes.contains(snapshot_id) {
            return Err(AppError::Provider(format!(
                "snapshot '{snapshot_id}' is in use"
            )));
        }

        let before = state.snapshots.len();
        state
            .snapshots
            .retain(|stored| stored.snapshot.id() != snapshot_id);

        if state.snapshots.len() == before {
            return Err(AppError::Provider(format!(
                "snapshot '{snapshot_id}' does not exist"
            )));
        }

        Ok(())
    }
}
