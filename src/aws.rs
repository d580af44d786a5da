//! AWS-related code shared by both Lambda functions.

use aws_config::BehaviorVersion;

use crate::prelude::*;

/// Load the function's AWS configuration using standard conventions.
///
/// Lambda supplies region and credentials through the environment, so the
/// default provider chain is all we need.
pub async fn load_aws_config() -> Result<aws_config::SdkConfig> {
    Ok(aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await)
}
