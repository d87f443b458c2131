//! Patch the Databricks cross-account role's inline policy with the bucket ARNs

use crate::aws::error::classify_anyhow_error;
use crate::aws::iam::IamOperations;
use crate::aws::policy::{PolicyDocument, patch_s3_resources};
use crate::config::RoleSettings;
use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Role '{role}' or its inline policy '{policy}' does not exist")]
    NotFound { role: String, policy: String },
}

/// Result of a patch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolePatchOutcome {
    /// No statement has an `s3:` action and a `Resource` field
    NothingToUpdate,
    /// Every matching statement already lists both ARNs
    AlreadyUpToDate { statements: usize },
    /// The document was written back
    Updated { statements: usize, added: usize },
}

impl std::fmt::Display for RolePatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RolePatchOutcome::NothingToUpdate => {
                write!(f, "no S3 statements with a Resource field; nothing to update")
            }
            RolePatchOutcome::AlreadyUpToDate { statements } => {
                write!(f, "{statements} S3 statement(s) already up to date")
            }
            RolePatchOutcome::Updated { statements, added } => {
                write!(f, "added {added} resource(s) across {statements} S3 statement(s)")
            }
        }
    }
}

fn not_found(err: anyhow::Error, role: &RoleSettings) -> anyhow::Error {
    if classify_anyhow_error(&err).is_some_and(|e| e.is_not_found()) {
        PatchError::NotFound {
            role: role.role_name.clone(),
            policy: role.policy_name.clone(),
        }
        .into()
    } else {
        err
    }
}

/// Add `bucket_arn` and `bucket_arn/*` to the role's S3 statements.
#[instrument(skip_all, fields(role = %role.role_name, policy = %role.policy_name, bucket_arn = %bucket_arn))]
pub async fn patch_role_policy<I: IamOperations>(
    iam: &I,
    role: &RoleSettings,
    bucket_arn: &str,
) -> Result<RolePatchOutcome> {
    let document = iam
        .get_role_policy(&role.role_name, &role.policy_name)
        .await
        .map_err(|e| not_found(e, role))?;

    let mut policy: PolicyDocument =
        serde_json::from_str(&document).context("Role policy is not a valid policy document")?;

    let patch = patch_s3_resources(&mut policy, bucket_arn);
    let outcome = if patch.matched == 0 {
        RolePatchOutcome::NothingToUpdate
    } else if !patch.needs_write() {
        RolePatchOutcome::AlreadyUpToDate {
            statements: patch.matched,
        }
    } else {
        let document =
            serde_json::to_string(&policy).context("Failed to serialize role policy")?;
        iam.put_role_policy(&role.role_name, &role.policy_name, &document)
            .await
            .map_err(|e| not_found(e, role))?;
        RolePatchOutcome::Updated {
            statements: patch.matched,
            added: patch.added,
        }
    };

    info!(outcome = %outcome, "Role policy patch finished");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::error::classify_aws_error;
    use crate::aws::iam::MockIamOperations;
    use serde_json::json;

    const ARN: &str = "arn:aws:s3:::lake";

    fn role() -> RoleSettings {
        RoleSettings {
            role_name: "xacct".to_string(),
            policy_name: "inline".to_string(),
        }
    }

    fn iam_returning(doc: serde_json::Value) -> MockIamOperations {
        let mut iam = MockIamOperations::new();
        let text = doc.to_string();
        iam.expect_get_role_policy()
            .withf(|r, p| r == "xacct" && p == "inline")
            .times(1)
            .returning(move |_, _| Ok(text.clone()));
        iam
    }

    #[tokio::test]
    async fn test_writes_patched_document() {
        let mut iam = iam_returning(json!({
            "Version": "2012-10-17",
            "Statement": [
                {"Effect": "Allow", "Action": ["s3:GetObject"], "Resource": ["arn:aws:s3:::old"]},
                {"Effect": "Allow", "Action": ["ec2:*"], "Resource": "*"}
            ]
        }));
        iam.expect_put_role_policy()
            .withf(|_, _, doc| {
                let v: serde_json::Value = serde_json::from_str(doc).unwrap();
                v["Statement"][0]["Resource"] == json!(["arn:aws:s3:::old", ARN, "arn:aws:s3:::lake/*"])
                    && v["Statement"][1]["Resource"] == "*"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let outcome = patch_role_policy(&iam, &role(), ARN).await.unwrap();
        assert_eq!(outcome, RolePatchOutcome::Updated { statements: 1, added: 2 });
    }

    #[tokio::test]
    async fn test_nothing_to_update_skips_write() {
        let mut iam = iam_returning(json!({
            "Statement": [{"Effect": "Allow", "Action": "ec2:*", "Resource": "*"}]
        }));
        iam.expect_put_role_policy().never();

        let outcome = patch_role_policy(&iam, &role(), ARN).await.unwrap();
        assert_eq!(outcome, RolePatchOutcome::NothingToUpdate);
    }

    #[tokio::test]
    async fn test_already_up_to_date_skips_write() {
        let mut iam = iam_returning(json!({
            "Statement": [{"Action": ["s3:*"], "Resource": [ARN, "arn:aws:s3:::lake/*"]}]
        }));
        iam.expect_put_role_policy().never();

        let outcome = patch_role_policy(&iam, &role(), ARN).await.unwrap();
        assert_eq!(outcome, RolePatchOutcome::AlreadyUpToDate { statements: 1 });
    }

    #[tokio::test]
    async fn test_missing_role_is_not_found() {
        let mut iam = MockIamOperations::new();
        iam.expect_get_role_policy().returning(|_, _| {
            Err(anyhow::Error::new(classify_aws_error(Some("NoSuchEntity"), Some("no role")))
                .context("Failed to get policy"))
        });

        let err = patch_role_policy(&iam, &role(), ARN).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PatchError>(),
            Some(PatchError::NotFound { role, .. }) if role == "xacct"
        ));
    }

    #[tokio::test]
    async fn test_other_failures_pass_through() {
        let mut iam = MockIamOperations::new();
        iam.expect_get_role_policy()
            .returning(|_, _| Err(anyhow::anyhow!("AccessDenied")));

        let err = patch_role_policy(&iam, &role(), ARN).await.unwrap_err();
        assert!(err.downcast_ref::<PatchError>().is_none());
        assert!(err.to_string().contains("AccessDenied"));
    }
}
