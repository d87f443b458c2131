//! Group, user and membership upserts driven by a roster
//!
//! A run resolves the roster's group once, then walks the rows in order:
//! resolve or create the user, then add them to the group unless they are
//! already a member. A group failure aborts the run; any per-row failure is
//! recorded in that row's outcome and the run continues with the next row.

use crate::scim::{IdentityApi, NewUser, ScimError, ScimGroup, ScimUser};
use dbx_provision_common::{PersonName, Roster};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// Whether a user was found or created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    Existing,
    Created,
}

/// Which per-row step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStage {
    ResolveUser,
    AddMember,
}

impl std::fmt::Display for RowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowStage::ResolveUser => write!(f, "resolve user"),
            RowStage::AddMember => write!(f, "add member"),
        }
    }
}

/// What happened to one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowResult {
    /// User added to the group
    Added { user_id: String, user: UserAction },
    /// User was already a member; no membership call was made
    AlreadyMember { user_id: String, user: UserAction },
    /// The email cannot form a user; no call was made
    Invalid { reason: String },
    /// A call failed; the row was skipped
    Failed { stage: RowStage, error: String },
}

/// Outcome of one roster row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    /// 1-based row number, excluding the header
    pub row: usize,
    pub email: String,
    #[serde(flatten)]
    pub result: RowResult,
}

/// Counts over a report's rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionSummary {
    pub rows: usize,
    pub users_created: usize,
    pub users_existing: usize,
    pub members_added: usize,
    pub already_members: usize,
    pub invalid: usize,
    pub failed: usize,
}

/// Result of a provisioning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub group_name: String,
    pub group_id: String,
    pub group_created: bool,
    pub rows: Vec<RowOutcome>,
}

impl ProvisionReport {
    pub fn summary(&self) -> ProvisionSummary {
        let mut summary = ProvisionSummary {
            rows: self.rows.len(),
            ..Default::default()
        };
        for outcome in &self.rows {
            let user = match &outcome.result {
                RowResult::Added { user, .. } => {
                    summary.members_added += 1;
                    Some(*user)
                }
                RowResult::AlreadyMember { user, .. } => {
                    summary.already_members += 1;
                    Some(*user)
                }
                RowResult::Invalid { .. } => {
                    summary.invalid += 1;
                    None
                }
                RowResult::Failed { .. } => {
                    summary.failed += 1;
                    None
                }
            };
            match user {
                Some(UserAction::Created) => summary.users_created += 1,
                Some(UserAction::Existing) => summary.users_existing += 1,
                None => {}
            }
        }
        summary
    }

    /// True if every row ended with the user in the group
    pub fn is_complete(&self) -> bool {
        let s = self.summary();
        s.invalid == 0 && s.failed == 0
    }
}

/// Reject emails that cannot be used as a user name or in a lookup filter
pub fn validate_email(email: &str) -> Result<(), ScimError> {
    if email.is_empty() {
        return Err(ScimError::validation("email", "empty"));
    }
    let Some((local, _domain)) = email.split_once('@') else {
        return Err(ScimError::validation("email", format!("'{email}' has no '@'")));
    };
    if local.is_empty() {
        return Err(ScimError::validation(
            "email",
            format!("'{email}' has an empty local part"),
        ));
    }
    if email.contains('\'') {
        return Err(ScimError::validation("email", format!("'{email}' contains a quote")));
    }
    Ok(())
}

/// Runs the upserts for one roster against an identity backend
pub struct IdentityProvisioner<'a, A> {
    api: &'a A,
}

impl<'a, A: IdentityApi> IdentityProvisioner<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Look the group up by display name and create it only if absent
    pub async fn resolve_group(&self, name: &str) -> Result<(ScimGroup, bool), ScimError> {
        if let Some(group) = self.api.find_group_by_name(name).await? {
            info!(group = %name, group_id = %group.id, "Group exists");
            return Ok((group, false));
        }
        let group = self.api.create_group(name).await?;
        info!(group = %name, group_id = %group.id, "Group created");
        Ok((group, true))
    }

    /// Look the user up by email and create them only if absent
    pub async fn resolve_user(&self, email: &str) -> Result<(ScimUser, UserAction), ScimError> {
        validate_email(email)?;
        if let Some(user) = self.api.find_user_by_email(email).await? {
            return Ok((user, UserAction::Existing));
        }
        let new_user = NewUser::new(email, &PersonName::from_email(email));
        let user = self.api.create_user(&new_user).await?;
        info!(email = %email, user_id = %user.id, "User created");
        Ok((user, UserAction::Created))
    }

    /// Provision every row of `roster`. Only a group failure is an error.
    #[instrument(skip_all, fields(group = %roster.group_name(), rows = roster.len()))]
    pub async fn provision(&self, roster: &Roster) -> Result<ProvisionReport, ScimError> {
        let (group, group_created) = self.resolve_group(roster.group_name()).await?;
        let mut members: HashSet<String> = group.members.iter().map(|m| m.value.clone()).collect();

        let mut rows = Vec::with_capacity(roster.len());
        for (idx, row) in roster.rows().iter().enumerate() {
            let email = row.user_email.as_str();
            let result = self.provision_row(&group.id, email, &mut members).await;
            match &result {
                RowResult::Added { user_id, .. } => {
                    info!(email = %email, user_id = %user_id, "Added to group");
                }
                RowResult::AlreadyMember { user_id, .. } => {
                    info!(email = %email, user_id = %user_id, "Already a member");
                }
                RowResult::Invalid { reason } => {
                    warn!(row = idx + 1, email = %email, reason = %reason, "Skipping invalid row");
                }
                RowResult::Failed { stage, error } => {
                    warn!(row = idx + 1, email = %email, stage = %stage, error = %error, "Skipping row");
                }
            }
            rows.push(RowOutcome {
                row: idx + 1,
                email: email.to_string(),
                result,
            });
        }

        Ok(ProvisionReport {
            group_name: roster.group_name().to_string(),
            group_id: group.id,
            group_created,
            rows,
        })
    }

    async fn provision_row(
        &self,
        group_id: &str,
        email: &str,
        members: &mut HashSet<String>,
    ) -> RowResult {
        let (user, action) = match self.resolve_user(email).await {
            Ok(resolved) => resolved,
            Err(ScimError::Validation { reason, .. }) => return RowResult::Invalid { reason },
            Err(e) => {
                return RowResult::Failed {
                    stage: RowStage::ResolveUser,
                    error: error_chain(&e),
                };
            }
        };

        if members.contains(&user.id) {
            return RowResult::AlreadyMember {
                user_id: user.id,
                user: action,
            };
        }

        match self.api.add_member(group_id, &user.id).await {
            Ok(()) => {
                members.insert(user.id.clone());
                RowResult::Added {
                    user_id: user.id,
                    user: action,
                }
            }
            Err(e) => RowResult::Failed {
                stage: RowStage::AddMember,
                error: error_chain(&e),
            },
        }
    }
}

/// Error message with its sources joined by `: `
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
