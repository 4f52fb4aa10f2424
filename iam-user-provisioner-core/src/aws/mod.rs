//! AWS SDK integration: IAM client wrapper implementing [`IdentityBackend`].
//!
//! [`IdentityBackend`]: crate::backend::IdentityBackend

mod iam_client;

pub use iam_client::AwsIamBackend;

use aws_sdk_iam::config::Region;
use log::debug;

/// Load SDK configuration from the default credential chain, pinned to `region`.
pub(crate) async fn load_sdk_config(region: &str) -> aws_config::SdkConfig {
    debug!("Loading AWS configuration for region {region}");
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
