//! Typed settings for each command
//!
//! [`Settings`] layers the process environment over the env file (environment
//! wins, matching dotenv's default of not overriding existing variables) and
//! hands out one settings struct per concern. Required keys are checked here,
//! before any AWS or SCIM call is made.

use dbx_provision_common::defaults::{
    DEFAULT_SCIM_API_PATH, DEFAULT_SECURITY_GROUP_DESCRIPTION, DEFAULT_SECURITY_GROUP_NAME,
};
use dbx_provision_common::{EnvFile, EnvFileError, keys};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Settings errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required key is absent or empty in both the env file and the environment
    #[error("'{key}' is not set in the env file or environment")]
    Missing { key: &'static str },

    /// Only one half of a static credential pair is present
    #[error("'{present}' is set but '{missing}' is not")]
    IncompleteCredentials {
        present: &'static str,
        missing: &'static str,
    },

    /// The env file could not be read
    #[error(transparent)]
    EnvFile(#[from] EnvFileError),
}

/// Access key pair read from the env file
#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// AWS client configuration
#[derive(Debug, Clone)]
pub struct AwsSettings {
    /// AWS region
    pub region: String,
    /// AWS profile name (used when no static credentials are set)
    pub profile: Option<String>,
    /// Access key pair from the env file
    pub static_credentials: Option<StaticCredentials>,
}

/// Network provisioning parameters
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub security_group_name: String,
    pub security_group_description: String,
}

/// Bucket provisioning parameters
#[derive(Debug, Clone)]
pub struct BucketSettings {
    pub bucket_name: String,
    pub region: String,
    /// Databricks account id for the bucket policy condition
    pub databricks_account_id: String,
}

/// Role whose inline policy is patched
#[derive(Debug, Clone)]
pub struct RoleSettings {
    pub role_name: String,
    pub policy_name: String,
}

/// SCIM endpoint and credentials
#[derive(Clone)]
pub struct ScimSettings {
    /// Workspace URL, e.g. `https://dbc-1234.cloud.databricks.com`
    pub host: String,
    /// Bearer token
    pub token: String,
    /// API path below the host
    pub api_path: String,
}

impl std::fmt::Debug for ScimSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScimSettings")
            .field("host", &self.host)
            .field("api_path", &self.api_path)
            .finish_non_exhaustive()
    }
}

/// Env file plus environment overlay
#[derive(Debug, Clone)]
pub struct Settings {
    file: EnvFile,
    overlay: HashMap<String, String>,
}

impl Settings {
    /// Combine an env file with an explicit overlay (used by tests)
    pub fn new(file: EnvFile, overlay: HashMap<String, String>) -> Self {
        Self { file, overlay }
    }

    /// Load the env file at `path` and overlay the process environment
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let file = EnvFile::load(path)?;
        Ok(Self::new(file, std::env::vars().collect()))
    }

    /// Settings backed only by the process environment (Lambda)
    pub fn from_env() -> Self {
        Self::new(EnvFile::empty(""), std::env::vars().collect())
    }

    /// Non-empty value for `key`, environment first
    pub fn get(&self, key: &str) -> Option<&str> {
        let non_empty = |v: &str| !v.trim().is_empty();
        self.overlay
            .get(key)
            .map(String::as_str)
            .filter(|v| non_empty(*v))
            .or_else(|| self.file.get(key).filter(|v| non_empty(*v)))
            .map(str::trim)
    }

    /// Value for a required key
    pub fn require(&self, key: &'static str) -> Result<&str, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing { key })
    }

    /// The env file, for merging outputs back
    pub fn file(&self) -> &EnvFile {
        &self.file
    }

    /// Mutable env file; outputs merged here are also visible through [`Settings::get`]
    /// unless the environment overrides them
    pub fn file_mut(&mut self) -> &mut EnvFile {
        &mut self.file
    }

    /// AWS client settings. `profile_override` comes from `--aws-profile`.
    pub fn aws(&self, profile_override: Option<&str>) -> Result<AwsSettings, ConfigError> {
        let region = self.require(keys::AWS_REGION)?.to_string();

        let static_credentials = match (
            self.get(keys::AWS_ACCESS_KEY_ID),
            self.get(keys::AWS_SECRET_ACCESS_KEY),
        ) {
            (Some(id), Some(secret)) => Some(StaticCredentials {
                access_key_id: id.to_string(),
                secret_access_key: secret.to_string(),
            }),
            (Some(_), None) => {
                return Err(ConfigError::IncompleteCredentials {
                    present: keys::AWS_ACCESS_KEY_ID,
                    missing: keys::AWS_SECRET_ACCESS_KEY,
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteCredentials {
                    present: keys::AWS_SECRET_ACCESS_KEY,
                    missing: keys::AWS_ACCESS_KEY_ID,
                });
            }
            (None, None) => None,
        };

        let profile = profile_override
            .or_else(|| self.get(keys::AWS_PROFILE))
            .map(str::to_string);

        Ok(AwsSettings {
            region,
            profile,
            static_credentials,
        })
    }

    /// Network settings; name and description fall back to defaults
    pub fn network(&self) -> NetworkSettings {
        NetworkSettings {
            security_group_name: self
                .get(keys::SECURITY_GROUP_NAME)
                .unwrap_or(DEFAULT_SECURITY_GROUP_NAME)
                .to_string(),
            security_group_description: self
                .get(keys::SECURITY_GROUP_DESCRIPTION)
                .unwrap_or(DEFAULT_SECURITY_GROUP_DESCRIPTION)
                .to_string(),
        }
    }

    /// Bucket settings; the bucket name, region and account id are required
    pub fn bucket(&self) -> Result<BucketSettings, ConfigError> {
        Ok(BucketSettings {
            bucket_name: self.require(keys::S3_BUCKET_NAME)?.to_string(),
            region: self.require(keys::AWS_REGION)?.to_string(),
            databricks_account_id: self.require(keys::DATABRICKS_ACCOUNT_ID)?.to_string(),
        })
    }

    /// Role settings for the inline policy patch
    pub fn role(&self) -> Result<RoleSettings, ConfigError> {
        Ok(RoleSettings {
            role_name: self.require(keys::DATABRICKS_ROLE_NAME)?.to_string(),
            policy_name: self.require(keys::POLICY_NAME)?.to_string(),
        })
    }

    /// Everything the `bucket` command needs up front. The role is required
    /// only when it will be patched afterwards.
    pub fn bucket_and_role(
        &self,
        patch_role: bool,
    ) -> Result<(BucketSettings, Option<RoleSettings>), ConfigError> {
        let bucket = self.bucket()?;
        let role = patch_role.then(|| self.role()).transpose()?;
        Ok((bucket, role))
    }

    /// Bucket ARN recorded by an earlier `bucket` run
    pub fn bucket_arn(&self) -> Result<&str, ConfigError> {
        self.require(keys::S3_BUCKET_ARN)
    }

    /// SCIM settings
    pub fn scim(&self) -> Result<ScimSettings, ConfigError> {
        Ok(ScimSettings {
            host: self.require(keys::DATABRICKS_HOST)?.to_string(),
            token: self.require(keys::DATABRICKS_TOKEN)?.to_string(),
            api_path: self
                .get(keys::SCIM_API_PATH)
                .unwrap_or(DEFAULT_SCIM_API_PATH)
                .to_string(),
        })
    }
}
