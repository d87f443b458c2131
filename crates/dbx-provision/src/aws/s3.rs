//! S3 bucket and object management

use crate::aws::context::AwsContext;
use crate::aws::error::AwsError;
use anyhow::{Context, Result};
use aws_sdk_s3::{
    Client,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};
use dbx_provision_common::ObjectRef;
use dbx_provision_common::defaults::DEFAULT_S3_REGION;
use tracing::{debug, info};

/// Location constraint to send when creating a bucket in `region`.
///
/// `us-east-1` is the default location and rejects an explicit constraint.
pub fn location_constraint_for(region: &str) -> Option<&str> {
    (region != DEFAULT_S3_REGION).then_some(region)
}

/// Result of a bucket create call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Created,
    /// The caller already owned a bucket with this name
    Reused,
}

/// S3 client for the workspace bucket and roster objects
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Create a new S3 client
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    /// Create an S3 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }

    /// Create a bucket, reusing it when the caller already owns it
    pub async fn create_bucket(&self, bucket_name: &str, region: &str) -> Result<BucketStatus> {
        info!(bucket = %bucket_name, region = %region, "Creating S3 bucket");

        let mut request = self.client.create_bucket().bucket(bucket_name);
        if let Some(constraint) = location_constraint_for(region) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(constraint))
                    .build(),
            );
        }

        match request.send().await.map_err(AwsError::from_sdk) {
            Ok(_) => {
                info!(bucket = %bucket_name, "Bucket created");
                Ok(BucketStatus::Created)
            }
            Err(e) if e.is_already_exists() => {
                info!(bucket = %bucket_name, "Bucket already owned by this account, reusing");
                Ok(BucketStatus::Reused)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to create bucket {bucket_name}")),
        }
    }

    /// Replace the bucket policy
    pub async fn put_bucket_policy(&self, bucket_name: &str, policy: &str) -> Result<()> {
        self.client
            .put_bucket_policy()
            .bucket(bucket_name)
            .policy(policy)
            .send()
            .await
            .map_err(AwsError::from_sdk)
            .with_context(|| format!("Failed to put bucket policy on {bucket_name}"))?;

        info!(bucket = %bucket_name, "Bucket policy applied");
        Ok(())
    }

    /// Download an object and decode it as UTF-8
    pub async fn get_object_text(&self, object: &ObjectRef) -> Result<String> {
        debug!(object = %object, "Downloading object");

        let response = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(AwsError::from_sdk)
            .with_context(|| format!("Failed to get {object}"))?;

        let bytes = response
            .body
            .collect()
            .await
            .with_context(|| format!("Failed to read body of {object}"))?
            .into_bytes();

        String::from_utf8(bytes.to_vec()).with_context(|| format!("{object} is not valid UTF-8"))
    }
}

/// Bucket operations used by the bucket workflow
#[allow(async_fn_in_trait)] // Internal use only
#[cfg_attr(test, mockall::automock)]
pub trait S3Operations {
    async fn create_bucket(&self, bucket_name: &str, region: &str) -> Result<BucketStatus>;

    async fn put_bucket_policy(&self, bucket_name: &str, policy: &str) -> Result<()>;
}

/// Read access to objects, used to load rosters from S3
#[allow(async_fn_in_trait)] // Internal use only
#[cfg_attr(test, mockall::automock)]
pub trait ObjectStore {
    async fn get_object_text(&self, object: &ObjectRef) -> Result<String>;
}

impl S3Operations for S3Client {
    async fn create_bucket(&self, bucket_name: &str, region: &str) -> Result<BucketStatus> {
        S3Client::create_bucket(self, bucket_name, region).await
    }

    async fn put_bucket_policy(&self, bucket_name: &str, policy: &str) -> Result<()> {
        S3Client::put_bucket_policy(self, bucket_name, policy).await
    }
}

impl ObjectStore for S3Client {
    async fn get_object_text(&self, object: &ObjectRef) -> Result<String> {
        S3Client::get_object_text(self, object).await
    }
}
