//! Rotation runs against the in-memory provider.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Utc};
use snapkeep_application::{RotationService, RotationSettings, RunExitCode, RunReporter};
use snapkeep_domain::{Period, ResourceTag, RetentionPolicy, Snapshot, Volume};
use snapkeep_infrastructure::InMemorySnapshotProvider;

fn invoked_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .unwrap_or_default()
}

fn volume(id: &str, tags: Vec<ResourceTag>) -> Volume {
    Volume::new(id, tags).unwrap_or_else(|_| unreachable!())
}

fn tagged() -> Vec<ResourceTag> {
    vec![
        ResourceTag::new("MakeSnapshot", "true"),
        ResourceTag::new("Team", "storage"),
    ]
}

fn settings(keep_hour: u32) -> RotationSettings {
    RotationSettings {
        retention: RetentionPolicy::default().with_keep(Period::Hour, keep_hour),
        volume_cooldown: Duration::ZERO,
        ..RotationSettings::default()
    }
}

fn hour_snapshots(snapshots: &[Snapshot]) -> usize {
    snapshots
        .iter()
        .filter(|snapshot| snapshot.description().starts_with("hour_snapshot"))
        .count()
}

#[tokio::test]
async fn repeated_runs_converge_to_retention_count() {
    let provider = Arc::new(InMemorySnapshotProvider::new().with_volume(volume("vol-1", tagged())));
    let service = RotationService::new(provider.clone(), settings(2));

    let mut created = 0;
    let mut deleted = 0;
    for _ in 0..5 {
        let stats = service.run(Period::Hour, invoked_at()).await;
        assert!(stats.is_success());
        created += stats.snap_creates;
        deleted += stats.snap_deletes;

        assert!(hour_snapshots(&provider.snapshots_of("vol-1").await) <= 2);
    }

    assert_eq!(created, 5);
    assert_eq!(deleted, 3);
    assert_eq!(hour_snapshots(&provider.snapshots_of("vol-1").await), 2);
}

#[tokio::test]
async fn new_snapshot_receives_volume_tags() {
    let provider = Arc::new(InMemorySnapshotProvider::new().with_volume(volume("vol-1", tagged())));
    let service = RotationService::new(provider.clone(), settings(4));

    let stats = service.run(Period::Hour, invoked_at()).await;
    assert_eq!(stats.snap_creates, 1);

    let snapshots = provider.snapshots_of("vol-1").await;
    assert_eq!(snapshots.len(), 1);
    assert_eq!(
        snapshots[0].description(),
        "hour_snapshot vol-1_hour_09:00 by snapshot script at 02-03-2026 09:00:00"
    );
    assert_eq!(provider.snapshot_tags(snapshots[0].id()).await, tagged());
}

#[tokio::test]
async fn failures_on_one_volume_leave_the_other_untouched() {
    let old = Utc::now() - TimeDelta::days(1);
    let existing = |id: &str, volume_id: &str, hours: i64| {
        Snapshot::new(
            id,
            volume_id,
            format!("hour_snapshot {volume_id}_hour_old"),
            old + TimeDelta::hours(hours),
        )
        .unwrap_or_else(|_| unreachable!())
    };

    let provider = Arc::new(
        InMemorySnapshotProvider::new()
            .with_volume(volume("vol-1", tagged()))
            .with_volume(volume("vol-2", tagged()))
            .with_snapshot(existing("snap-1a", "vol-1", 0))
            .with_snapshot(existing("snap-1b", "vol-1", 1))
            .with_snapshot(existing("snap-2a", "vol-2", 0))
            .with_snapshot(existing("snap-2b", "vol-2", 1)),
    );
    provider.fail_creates_for("vol-1").await;
    provider.fail_deletes_for("snap-1a").await;
    let service = RotationService::new(provider.clone(), settings(1));

    let stats = service.run(Period::Hour, invoked_at()).await;

    assert_eq!(stats.total_vols, 2);
    assert_eq!(stats.snap_creates, 1);
    // vol-1: failed create, failed delete of snap-1a; vol-2: deletes snap-2a and snap-2b.
    assert_eq!(stats.snap_errors, 2);
    assert_eq!(stats.snap_deletes, 2);

    let vol_1: Vec<String> = provider
        .snapshots_of("vol-1")
        .await
        .iter()
        .map(|snapshot| snapshot.id().to_owned())
        .collect();
    assert_eq!(vol_1, vec!["snap-1a", "snap-1b"]);
    assert_eq!(provider.snapshots_of("vol-2").await.len(), 1);

    let report = RunReporter::new().report(&stats, &invoked_at()).await;
    assert_eq!(report.exit_code, RunExitCode::RotationFailed);
}

#[tokio::test]
async fn unreachable_provider_fails_the_run() {
    let provider = Arc::new(InMemorySnapshotProvider::new().with_volume(volume("vol-1", tagged())));
    provider.set_unreachable(true).await;
    let service = RotationService::new(provider.clone(), settings(2));

    let stats = service.run(Period::Hour, invoked_at()).await;

    assert_eq!(stats.total_errors, 1);
    assert_eq!(stats.total_vols, 0);
    let report = RunReporter::new().report(&stats, &invoked_at()).await;
    assert_eq!(report.exit_code.code(), 3);
}
