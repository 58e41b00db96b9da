//! EC2-backed snapshot provider.
//!
//! Volumes are found with `tag:<name>` filters, instance-tagged selection goes
//! through `DescribeInstances` and the `attachment.instance-id` volume filter,
//! and snapshot listings are restricted to snapshots owned by the caller.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::primitives::DateTime as AwsDateTime;
use aws_sdk_ec2::types::{Filter, Tag};
use chrono::{DateTime, Utc};
use snapkeep_application::SnapshotProvider;
use snapkeep_core::{AppError, AppResult};
use snapkeep_domain::{ResourceTag, Snapshot, Volume};
use tracing::debug;

/// Prefix of tag keys reserved by AWS, which `CreateTags` refuses.
const RESERVED_TAG_PREFIX: &str = "aws:";

/// EC2 implementation of the snapshot provider port.
#[derive(Clone)]
pub struct Ec2SnapshotProvider {
    client: Client,
}

impl Ec2SnapshotProvider {
    /// Creates a provider from loaded AWS configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    async fn describe_volumes(&self, filters: Vec<Filter>) -> AppResult<Vec<Volume>> {
        let mut volumes = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_volumes()
                .set_filters(Some(filters.clone()))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|error| {
                    AppError::Provider(format!(
                        "DescribeVolumes failed: {}",
                        DisplayErrorContext(&error)
                    ))
                })?;

            for volume in output.volumes() {
                let Some(volume_id) = volume.volume_id() else {
                    continue;
                };
                volumes.push(Volume::new(volume_id, to_resource_tags(volume.tags()))?);
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_owned()),
                _ => break,
            }
        }

        debug!(volume_count = volumes.len(), "described volumes");
        Ok(volumes)
    }
}

#[async_trait]
impl SnapshotProvider for Ec2SnapshotProvider {
    async fn find_volumes_by_tag(&self, tag: &ResourceTag) -> AppResult<Vec<Volume>> {
        self.describe_volumes(vec![tag_filter(tag)]).await
    }

    async fn find_instance_ids_by_tag(
        &self,
        tag: &ResourceTag,
        running_only: bool,
    ) -> AppResult<Vec<String>> {
        let mut filters = vec![tag_filter(tag)];
        if running_only {
            filters.push(
                Filter::builder()
                    .name("instance-state-name")
                    .values("running")
                    .build(),
            );
        }

        let mut instance_ids = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_instances()
                .set_filters(Some(filters.clone()))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|error| {
                    AppError::Provider(format!(
                        "DescribeInstances failed: {}",
                        DisplayErrorContext(&error)
                    ))
                })?;

            instance_ids.extend(
                output
                    .reservations()
                    .iter()
                    .flat_map(|reservation| reservation.instances())
                    .filter_map(|instance| instance.instance_id())
                    .map(str::to_owned),
            );

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_owned()),
                _ => break,
            }
        }

        debug!(instance_count = instance_ids.len(), "described instances");
        Ok(instance_ids)
    }

    async fn find_volumes_attached_to(&self, instance_ids: &[String]) -> AppResult<Vec<Volume>> {
        let filter = Filter::builder()
            .name("attachment.instance-id")
            .set_values(Some(instance_ids.to_vec()))
            .build();

        self.describe_volumes(vec![filter]).await
    }

    async fn create_snapshot(&self, volume_id: &str, description: &str) -> AppResult<Snapshot> {
        let output = self
            .client
            .create_snapshot()
            .volume_id(volume_id)
            .description(description)
            .send()
            .await
            .map_err(|error| {
                AppError::Provider(format!(
                    "CreateSnapshot for volume '{volume_id}' failed: {}",
                    DisplayErrorContext(&error)
                ))
            })?;

        let snapshot_id = output.snapshot_id().ok_or_else(|| {
            AppError::Provider(format!(
                "CreateSnapshot for volume '{volume_id}' returned no snapshot id"
            ))
        })?;

        Snapshot::new(
            snapshot_id,
            volume_id,
            description,
            output
                .start_time()
                .and_then(to_utc)
                .unwrap_or_else(Utc::now),
        )
    }

    async fn tag_snapshot(&self, snapshot_id: &str, tags: &[ResourceTag]) -> AppResult<()> {
        let tags: Vec<Tag> = tags
            .iter()
            .filter(|tag| !tag.key.starts_with(RESERVED_TAG_PREFIX))
            .map(|tag| Tag::builder().key(&tag.key).value(&tag.value).build())
            .collect();

        if tags.is_empty() {
            return Ok(());
        }

        self.client
            .create_tags()
            .resources(snapshot_id)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|error| {
                AppError::Provider(format!(
                    "CreateTags for snapshot '{snapshot_id}' failed: {}",
                    DisplayErrorContext(&error)
                ))
            })?;

        Ok(())
    }

    async fn list_volume_snapshots(&self, volume_id: &str) -> AppResult<Vec<Snapshot>> {
        let mut snapshots = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_snapshots()
                .owner_ids("self")
                .filters(Filter::builder().name("volume-id").values(volume_id).build())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|error| {
                    AppError::Provider(format!(
                        "DescribeSnapshots for volume '{volume_id}' failed: {}",
                        DisplayErrorContext(&error)
                    ))
                })?;

            for snapshot in output.snapshots() {
                let (Some(snapshot_id), Some(start_time)) = (
                    snapshot.snapshot_id(),
                    snapshot.start_time().and_then(to_utc),
                ) else {
                    continue;
                };

                snapshots.push(Snapshot::new(
                    snapshot_id,
                    snapshot.volume_id().unwrap_or(volume_id),
                    snapshot.description().unwrap_or_default(),
                    start_time,
                )?);
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_owned()),
                _ => break,
            }
        }

        Ok(snapshots)
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> AppResult<()> {
        self.client
            .delete_snapshot()
            .snapshot_id(snapshot_id)
            .send()
            .await
            .map_err(|error| {
                AppError::Provider(format!(
                    "DeleteSnapshot '{snapshot_id}' failed: {}",
                    DisplayErrorContext(&error)
                ))
            })?;

        Ok(())
    }
}

fn tag_filter(tag: &ResourceTag) -> Filter {
    Filter::builder()
        .name(format!("tag:{}", tag.key))
        .values(&tag.value)
        .build()
}

fn to_resource_tags(tags: &[Tag]) -> Vec<ResourceTag> {
    tags.iter()
        .filter_map(|tag| {
            tag.key()
                .map(|key| ResourceTag::new(key, tag.value().unwrap_or_default()))
        })
        .collect()
}

fn to_utc(value: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

#[cfg(test)]
mod tests {
    use aws_sdk_ec2::primitives::DateTime as AwsDateTime;
    use aws_sdk_ec2::types::Tag;
    use snapkeep_domain::ResourceTag;

    use super::{tag_filter, to_resource_tags, to_utc};

    #[test]
    fn tag_filter_targets_tag_key() {
        let filter = tag_filter(&ResourceTag::new("MakeSnapshot", "true"));

        assert_eq!(filter.name(), Some("tag:MakeSnapshot"));
        assert_eq!(filter.values(), ["true".to_owned()]);
    }

    #[test]
    fn provider_tags_without_key_are_dropped() {
        let tags = vec![
            Tag::builder().key("Name").value("db").build(),
            Tag::builder().value("orphan").build(),
            Tag::builder().key("Empty").build(),
        ];

        assert_eq!(
            to_resource_tags(&tags),
            vec![ResourceTag::new("Name", "db"), ResourceTag::new("Empty", "")]
        );
    }

    #[test]
    fn provider_timestamps_convert_to_utc() {
        let converted = to_utc(&AwsDateTime::from_secs(1_476_381_925));
        assert_eq!(
            converted.map(|value| value.to_rfc3339()),
            Some("2016-10-13T18:05:25+00:00".to_owned())
        );
    }
}
