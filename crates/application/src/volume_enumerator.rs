use std::sync::Arc;

use snapkeep_core::AppResult;
use snapkeep_domain::Volume;
use tracing::{debug, info};

use crate::rotation_ports::{SnapshotProvider, TagType, VolumeSelector};

/// Resolves tag criteria into the volumes of one run.
#[derive(Clone)]
pub struct VolumeEnumerator {
    provider: Arc<dyn SnapshotProvider>,
}

impl VolumeEnumerator {
    /// Creates a volume enumerator.
    #[must_use]
    pub fn new(provider: Arc<dyn SnapshotProvider>) -> Self {
        Self { provider }
    }

    /// Returns the volumes matching `selector`, in provider order.
    ///
    /// Instance-tagged selection resolves instances first and returns every
    /// volume attached to them. No instance means no volume, without a
    /// second provider call.
    pub async fn enumerate(&self, selector: &VolumeSelector) -> AppResult<Vec<Volume>> {
        debug!(
            tag_type = selector.tag_type.as_str(),
            tag_name = %selector.tag.key,
            tag_value = %selector.tag.value,
            "looking up tagged resources"
        );

        match selector.tag_type {
            TagType::Volume => self.provider.find_volumes_by_tag(&selector.tag).await,
            TagType::Instance => {
                let instance_ids = self
                    .provider
                    .find_instance_ids_by_tag(&selector.tag, selector.running_only)
                    .await?;

                if instance_ids.is_empty() {
                    info!(
                        tag_name = %selector.tag.key,
                        running_only = selector.running_only,
                        "no tagged instances found"
                    );
                    return Ok(Vec::new());
                }

                debug!(instance_count = instance_ids.len(), "resolving attached volumes");
                self.provider.find_volumes_attached_to(&instance_ids).await
            }
        }
    }
}
