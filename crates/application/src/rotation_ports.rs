mod notifier;
mod provider;
mod selection;

pub use notifier::{RunNotification, RunNotifier};
pub use provider::SnapshotProvider;
pub use selection::{TagType, VolumeSelector};
