//! IAM inline role policies

use crate::aws::context::AwsContext;
use crate::aws::error::AwsError;
use anyhow::{Context, Result};
use aws_sdk_iam::Client;
use tracing::{debug, info};

/// IAM client for reading and writing inline role policies
pub struct IamClient {
    client: Client,
}

impl IamClient {
    /// Create a new IAM client
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    /// Create an IAM client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }

    /// Fetch an inline role policy document as JSON text.
    ///
    /// IAM returns the document URL-encoded; this decodes it.
    pub async fn get_role_policy(&self, role_name: &str, policy_name: &str) -> Result<String> {
        let response = self
            .client
            .get_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(AwsError::from_sdk)
            .with_context(|| format!("Failed to get policy {policy_name} of role {role_name}"))?;

        let document = urlencoding::decode(response.policy_document())
            .context("Role policy document is not valid URL-encoded UTF-8")?
            .into_owned();

        debug!(role = %role_name, policy = %policy_name, bytes = document.len(), "Fetched role policy");
        Ok(document)
    }

    /// Replace an inline role policy document
    pub async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        document: &str,
    ) -> Result<()> {
        self.client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .policy_document(document)
            .send()
            .await
            .map_err(AwsError::from_sdk)
            .with_context(|| format!("Failed to put policy {policy_name} on role {role_name}"))?;

        info!(role = %role_name, policy = %policy_name, "Role policy updated");
        Ok(())
    }
}

/// Trait for IAM operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only
#[cfg_attr(test, mockall::automock)]
pub trait IamOperations {
    /// Decoded inline policy document
    async fn get_role_policy(&self, role_name: &str, policy_name: &str) -> Result<String>;

    /// Replace an inline policy document
    async fn put_role_policy(&self, role_name: &str, policy_name: &str, document: &str)
    -> Result<()>;
}

impl IamOperations for IamClient {
    async fn get_role_policy(&self, role_name: &str, policy_name: &str) -> Result<String> {
        IamClient::get_role_policy(self, role_name, policy_name).await
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        document: &str,
    ) -> Result<()> {
        IamClient::put_role_policy(self, role_name, policy_name, document).await
    }
}
