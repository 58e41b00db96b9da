use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snapkeep_core::{AppResult, NonEmptyString};

/// Key-value tag attached to a volume and copied onto its snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceTag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl ResourceTag {
    /// Creates a tag from key and value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Block-storage volume selected for rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    id: NonEmptyString,
    tags: Vec<ResourceTag>,
}

impl Volume {
    /// Creates a volume handle from a provider identifier and its tags.
    pub fn new(id: impl Into<String>, tags: Vec<ResourceTag>) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            tags,
        })
    }

    /// Returns provider volume identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns tags currently set on the volume.
    #[must_use]
    pub fn tags(&self) -> &[ResourceTag] {
        &self.tags
    }

    /// Returns whether the volume carries `key=value`.
    #[must_use]
    pub fn has_tag(&self, key: &str, value: &str) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.key == key && tag.value == value)
    }
}

/// Point-in-time snapshot of one volume as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    id: NonEmptyString,
    volume_id: String,
    description: String,
    start_time: DateTime<Utc>,
}

impl Snapshot {
    /// Creates a snapshot record.
    pub fn new(
        id: impl Into<String>,
        volume_id: impl Into<String>,
        description: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            volume_id: volume_id.into(),
            description: description.into(),
            start_time,
        })
    }

    /// Returns provider snapshot identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the identifier of the source volume.
    #[must_use]
    pub fn volume_id(&self) -> &str {
        self.volume_id.as_str()
    }

    /// Returns free-text description, which carries the retention label.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns provider-assigned creation time.
    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }
}
