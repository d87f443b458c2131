//! S3 object references

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing an object reference
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObjectRefError {
    /// Nothing to parse
    #[error("object reference is empty")]
    Empty,

    /// No `/` separating bucket and key
    #[error("object reference '{0}' has no key (expected s3://bucket/key)")]
    MissingKey(String),

    /// Bucket part is empty
    #[error("object reference '{0}' has no bucket (expected s3://bucket/key)")]
    MissingBucket(String),
}

/// Bucket and key of an S3 object, parsed from `s3://bucket/key` or `bucket/key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Whether `s` looks like an `s3://` URL rather than a local path
    pub fn is_s3_url(s: &str) -> bool {
        s.starts_with("s3://")
    }
}

impl FromStr for ObjectRef {
    type Err = ObjectRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ObjectRefError::Empty);
        }

        let rest = trimmed.strip_prefix("s3://").unwrap_or(trimmed);
        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| ObjectRefError::MissingKey(s.to_string()))?;

        if bucket.is_empty() {
            return Err(ObjectRefError::MissingBucket(s.to_string()));
        }
        if key.is_empty() {
            return Err(ObjectRefError::MissingKey(s.to_string()));
        }

        Ok(Self::new(bucket, key))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}
