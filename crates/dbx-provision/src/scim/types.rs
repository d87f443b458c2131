//! SCIM resource shapes

use dbx_provision_common::PersonName;
use serde::{Deserialize, Serialize};

pub const USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// Reference to a group member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Member {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display: None,
        }
    }
}

/// A group as returned by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimGroup {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl ScimGroup {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.value == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserName {
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub value: String,
    #[serde(default)]
    pub primary: bool,
}

/// A user as returned by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimUser {
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<UserName>,
    #[serde(default)]
    pub emails: Vec<Email>,
}

/// Body of `POST Users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub schemas: Vec<String>,
    pub user_name: String,
    pub name: UserName,
    pub emails: Vec<Email>,
}

impl NewUser {
    /// User keyed by `email` with the given display names
    pub fn new(email: &str, name: &PersonName) -> Self {
        Self {
            schemas: vec![USER_SCHEMA.to_string()],
            user_name: email.to_string(),
            name: UserName {
                given_name: name.given.clone(),
                family_name: name.family.clone(),
            },
            emails: vec![Email {
                value: email.to_string(),
                primary: true,
            }],
        }
    }
}

/// Body of `POST Groups`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub display_name: String,
}

impl NewGroup {
    pub fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
        }
    }
}

/// `ListResponse` envelope of filtered GETs
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(rename = "Resources", default = "Vec::new")]
    pub resources: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    pub value: Vec<Member>,
}

/// Body of `PATCH Groups/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOp {
    pub schemas: Vec<String>,
    #[serde(rename = "Operations")]
    pub operations: Vec<PatchOperation>,
}

impl PatchOp {
    /// Add the given user ids to a group's members
    pub fn add_members<I, S>(user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemas: vec![PATCH_OP_SCHEMA.to_string()],
            operations: vec![PatchOperation {
                op: "add".to_string(),
                path: "members".to_string(),
                value: user_ids.into_iter().map(Member::new).collect(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_user_body() {
        let name = PersonName::from_email("john.doe@example.com");
        let body = serde_json::to_value(NewUser::new("john.doe@example.com", &name)).unwrap();
        assert_eq!(
            body,
            json!({
                "schemas": [USER_SCHEMA],
                "userName": "john.doe@example.com",
                "name": {"givenName": "John", "familyName": "Doe"},
                "emails": [{"value": "john.doe@example.com", "primary": true}]
            })
        );
    }

    #[test]
    fn patch_op_body() {
        let body = serde_json::to_value(PatchOp::add_members(["u-1"])).unwrap();
        assert_eq!(
            body,
            json!({
                "schemas": [PATCH_OP_SCHEMA],
                "Operations": [{"op": "add", "path": "members", "value": [{"value": "u-1"}]}]
            })
        );
    }

    #[test]
    fn list_response_tolerates_missing_resources() {
        let list: ListResponse<ScimGroup> =
            serde_json::from_value(json!({"totalResults": 0})).unwrap();
        assert!(list.resources.is_empty());

        let list: ListResponse<ScimGroup> = serde_json::from_value(json!({
            "totalResults": 1,
            "Resources": [{"id": "g-1", "displayName": "eng", "members": [{"value": "u-1", "display": "J"}]}]
        }))
        .unwrap();
        assert!(list.resources[0].has_member("u-1"));
        assert!(!list.resources[0].has_member("u-2"));
    }
}
