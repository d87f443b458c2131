//! AWS error classification
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::fmt::Debug;
use thiserror::Error;

/// AWS error categories
#[derive(Debug, Clone, Error)]
pub enum AwsError {
    /// Resource was not found
    #[error("Resource not found: {message}")]
    NotFound { code: String, message: String },

    /// Resource already exists and is owned by the caller
    #[error("Resource already exists: {message}")]
    AlreadyExists { code: String, message: String },

    /// Name or state collides with a resource the caller does not own
    #[error("Conflict ({code}): {message}")]
    Conflict { code: String, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    Throttled { message: String },

    /// Resource has dependent objects
    #[error("Resource has dependent objects: {message}")]
    DependencyViolation { message: String },

    /// Request never got a response (DNS, TLS, connection, timeout)
    #[error("Failed to reach AWS: {message}")]
    Transport { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Classify an SDK error returned by any AWS service client.
    pub fn from_sdk<E, R>(err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: Debug,
    {
        match &err {
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => AwsError::Transport {
                message: DisplayErrorContext(&err).to_string(),
            },
            _ => {
                let message = err
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
                classify_aws_error(err.code(), Some(&message))
            }
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AwsError::AlreadyExists { .. })
    }

    /// Error code reported by AWS, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::NotFound { code, .. }
            | AwsError::AlreadyExists { code, .. }
            | AwsError::Conflict { code, .. } => Some(code),
            AwsError::Sdk { code, .. } => code.as_deref(),
            AwsError::Throttled { .. }
            | AwsError::DependencyViolation { .. }
            | AwsError::Transport { .. } => None,
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            AwsError::Transport { .. } => {
                Some("Check network connectivity and that AWS_REGION names a real region.")
            }
            _ => self.code().and_then(suggestion_for_code),
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidVpcID.NotFound",
    "InvalidSubnetID.NotFound",
    "InvalidGroup.NotFound",
    "InvalidPermission.NotFound",
    "NoSuchBucket",
    "NoSuchKey",
    "NoSuchEntity",
];

/// Known AWS error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &[
    "InvalidPermission.Duplicate",
    "InvalidGroup.Duplicate",
    "EntityAlreadyExists",
    "BucketAlreadyOwnedByYou",
];

/// Known AWS error codes for collisions with resources owned elsewhere
const CONFLICT_CODES: &[&str] = &[
    "BucketAlreadyExists",
    "InvalidSubnet.Conflict",
    "InvalidVpc.Range",
    "OperationAborted",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Known AWS error codes for dependency violations (resource still in use)
const DEPENDENCY_CODES: &[&str] = &["DependencyViolation"];

/// Classify an AWS error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => AwsError::AlreadyExists {
            code: c.to_string(),
            message,
        },
        Some(c) if CONFLICT_CODES.contains(&c) => AwsError::Conflict {
            code: c.to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled { message },
        Some(c) if DEPENDENCY_CODES.contains(&c) => AwsError::DependencyViolation { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Find the typed AWS error in an `anyhow` error chain.
pub fn classify_anyhow_error(error: &anyhow::Error) -> Option<&AwsError> {
    error.chain().find_map(|cause| cause.downcast_ref::<AwsError>())
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "VpcLimitExceeded",
        "Delete unused VPCs or request a limit increase via the Service Quotas console.",
    ),
    (
        "UnauthorizedOperation",
        "The credentials lack the EC2 permission for this call.",
    ),
    (
        "AccessDenied",
        "The credentials lack the permission for this call.",
    ),
    (
        "InvalidClientTokenId",
        "Check AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY in the env file.",
    ),
    (
        "SignatureDoesNotMatch",
        "Check AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY in the env file.",
    ),
    (
        "ExpiredToken",
        "The session credentials expired; refresh them and retry.",
    ),
    (
        "BucketAlreadyExists",
        "Bucket names are global; choose another S3_BUCKET_NAME.",
    ),
    (
        "IllegalLocationConstraintException",
        "The bucket region does not match AWS_REGION.",
    ),
    (
        "NoSuchEntity",
        "Check Databricks_Role_Name and Policy_name in the env file.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<&'static str> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| *s)
}
