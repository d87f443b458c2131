//! In-memory identity backend
//!
//! Behaves like a SCIM server for lookups and creates, keeps membership, and
//! records every call in order so tests can assert exact call sequences.

use dbx_provision::scim::{
    IdentityApi, Member, NewUser, ScimError, ScimGroup, ScimUser, StatusCode,
};
use std::collections::HashSet;
use std::sync::Mutex;

/// One call made against the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindGroup(String),
    CreateGroup(String),
    FindUser(String),
    CreateUser(String),
    AddMember { group_id: String, user_id: String },
}

#[derive(Debug, Default)]
struct State {
    groups: Vec<ScimGroup>,
    users: Vec<ScimUser>,
    calls: Vec<Call>,
    next_id: u32,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// Call-tracking identity backend
#[derive(Debug, Default)]
pub struct FakeIdentityApi {
    state: Mutex<State>,
    failing_emails: HashSet<String>,
    fail_group_create: bool,
}

impl FakeIdentityApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing group
    pub fn with_group(self, display_name: &str, member_ids: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.id("group");
            state.groups.push(ScimGroup {
                id,
                display_name: display_name.to_string(),
                members: member_ids.iter().map(|m| Member::new(*m)).collect(),
            });
        }
        self
    }

    /// Seed an existing user
    pub fn with_user(self, email: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.id("user");
            state.users.push(ScimUser {
                id,
                user_name: email.to_string(),
                name: None,
                emails: Vec::new(),
            });
        }
        self
    }

    /// Make every call involving `email` fail with a 500
    pub fn failing_for(mut self, email: &str) -> Self {
        self.failing_emails.insert(email.to_string());
        self
    }

    /// Make group creation fail with a 403
    pub fn failing_group_create(mut self) -> Self {
        self.fail_group_create = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn user_id(&self, email: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.user_name == email)
            .map(|u| u.id.clone())
    }

    pub fn group(&self, display_name: &str) -> Option<ScimGroup> {
        let state = self.state.lock().unwrap();
        state
            .groups
            .iter()
            .find(|g| g.display_name == display_name)
            .cloned()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    pub fn group_count(&self) -> usize {
        self.state.lock().unwrap().groups.len()
    }

    fn server_error(url: &str) -> ScimError {
        ScimError::Status {
            url: url.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "injected failure".to_string(),
        }
    }
}

impl IdentityApi for FakeIdentityApi {
    async fn find_group_by_name(&self, name: &str) -> Result<Option<ScimGroup>, ScimError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FindGroup(name.to_string()));
        Ok(state
            .groups
            .iter()
            .find(|g| g.display_name == name)
            .cloned())
    }

    async fn create_group(&self, name: &str) -> Result<ScimGroup, ScimError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateGroup(name.to_string()));
        if self.fail_group_create {
            return Err(ScimError::Status {
                url: "Groups".to_string(),
                status: StatusCode::FORBIDDEN,
                body: "injected failure".to_string(),
            });
        }
        if state.groups.iter().any(|g| g.display_name == name) {
            return Err(ScimError::Conflict {
                url: "Groups".to_string(),
                body: format!("group {name} already exists"),
            });
        }
        let group = ScimGroup {
            id: state.id("group"),
            display_name: name.to_string(),
            members: Vec::new(),
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<ScimUser>, ScimError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FindUser(email.to_string()));
        if self.failing_emails.contains(email) {
            return Err(Self::server_error("Users"));
        }
        Ok(state.users.iter().find(|u| u.user_name == email).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<ScimUser, ScimError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateUser(user.user_name.clone()));
        if state.users.iter().any(|u| u.user_name == user.user_name) {
            return Err(ScimError::Conflict {
                url: "Users".to_string(),
                body: format!("user {} already exists", user.user_name),
            });
        }
        let created = ScimUser {
            id: state.id("user"),
            user_name: user.user_name.clone(),
            name: Some(user.name.clone()),
            emails: user.emails.clone(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn add_member(&self, group_id: &str, user_id: &str) -> Result<(), ScimError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::AddMember {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
        });
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| ScimError::NotFound {
                url: format!("Groups/{group_id}"),
            })?;
        if !group.has_member(user_id) {
            group.members.push(Member::new(user_id));
        }
        Ok(())
    }
}
