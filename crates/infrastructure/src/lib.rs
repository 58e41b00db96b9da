//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod aws_session;
mod ec2_snapshot_provider;
mod in_memory_snapshot_provider;
mod notification_target;
mod sns_run_notifier;
mod webhook_run_notifier;

pub use aws_session::load_aws_session;
pub use ec2_snapshot_provider::Ec2SnapshotProvider;
pub use in_memory_snapshot_provider::InMemorySnapshotProvider;
pub use notification_target::NotificationTarget;
pub use sns_run_notifier::SnsRunNotifier;
pub use webhook_run_notifier::WebhookRunNotifier;
