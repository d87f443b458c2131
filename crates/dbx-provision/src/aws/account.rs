//! AWS caller identity

use crate::aws::error::AwsError;
use anyhow::{Context, Result};
use tracing::info;

/// Strongly-typed AWS account ID (12-digit string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

/// The identity behind the loaded credentials
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub account: AccountId,
    pub arn: String,
}

/// Validate credentials via STS GetCallerIdentity.
///
/// Needs no IAM permissions, so a failure here means the credentials
/// themselves are missing, malformed or expired.
pub async fn get_caller_identity(config: &aws_config::SdkConfig) -> Result<CallerIdentity> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .map_err(AwsError::from_sdk)
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;
    let arn = identity.arn().unwrap_or_default().to_string();

    info!(account_id = %account, arn = %arn, "AWS credentials validated");

    Ok(CallerIdentity {
        account: AccountId(account.to_string()),
        arn,
    })
}
