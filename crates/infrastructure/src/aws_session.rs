use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::info;

/// Loads shared AWS client configuration.
///
/// Region and profile fall back to the default provider chain when unset,
/// so environment credentials keep working without a profile.
pub async fn load_aws_session(region: Option<&str>, profile: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_owned()));
    }

    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }

    let config = loader.load().await;
    info!(
        region = ?config.region(),
        profile = ?profile,
        "loaded AWS configuration"
    );

    config
}
