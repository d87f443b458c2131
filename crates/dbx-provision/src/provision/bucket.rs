//! Workspace root bucket and its policy

use crate::aws::policy::{bucket_arn, bucket_policy};
use crate::aws::s3::{BucketStatus, S3Operations};
use crate::config::BucketSettings;
use anyhow::{Context, Result};
use dbx_provision_common::{EnvFile, keys};
use tracing::{info, instrument};

/// The bucket the workflow created or reused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketResources {
    pub bucket_name: String,
    pub bucket_arn: String,
    pub status: BucketStatus,
}

/// Create or reuse the bucket, record its ARN in `env`, then apply the policy.
///
/// The ARN is merged as soon as the bucket exists, so a policy failure still
/// leaves it recorded. Callers save `env` whether or not this returns `Ok`.
#[instrument(skip_all, fields(bucket = %settings.bucket_name, region = %settings.region))]
pub async fn provision_bucket<S: S3Operations>(
    s3: &S,
    settings: &BucketSettings,
    env: &mut EnvFile,
) -> Result<BucketResources> {
    let status = s3
        .create_bucket(&settings.bucket_name, &settings.region)
        .await?;

    let arn = bucket_arn(&settings.bucket_name);
    env.set(keys::S3_BUCKET_ARN, arn.clone());
    info!(bucket_arn = %arn, status = ?status, "Bucket ready");

    let policy = bucket_policy(&settings.bucket_name, &settings.databricks_account_id);
    let policy = serde_json::to_string(&policy).context("Failed to serialize bucket policy")?;
    s3.put_bucket_policy(&settings.bucket_name, &policy).await?;

    Ok(BucketResources {
        bucket_name: settings.bucket_name.clone(),
        bucket_arn: arn,
        status,
    })
}
