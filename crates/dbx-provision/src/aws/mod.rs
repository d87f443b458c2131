//! AWS client modules
//!
//! This module provides wrappers around AWS SDK clients for:
//! - EC2: VPC, subnet and security group creation
//! - S3: Workspace bucket and roster downloads
//! - IAM: Inline role policy read and write
//! - STS: Credential validation

pub mod account;
pub mod context;
pub mod ec2;
pub mod error;
pub mod iam;
pub mod policy;
pub mod s3;
pub mod tags;

// Core clients
pub use account::{AccountId, CallerIdentity, get_caller_identity};
pub use context::AwsContext;
pub use ec2::{Ec2Client, Ec2Operations, IngressRule, IngressSource};
pub use iam::{IamClient, IamOperations};
pub use s3::{BucketStatus, ObjectStore, S3Client, S3Operations};

// Error handling
pub use error::{AwsError, classify_anyhow_error, classify_aws_error};
