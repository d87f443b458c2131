//! HTTP client for the SCIM identity API

use crate::config::ScimSettings;
use crate::scim::error::ScimError;
use crate::scim::types::{ListResponse, NewGroup, NewUser, PatchOp, ScimGroup, ScimUser};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Build an equality filter, e.g. `displayName eq 'data-eng'`.
///
/// Values containing a single quote cannot be expressed in this filter form
/// and are rejected.
pub fn eq_filter(attribute: &str, field: &'static str, value: &str) -> Result<String, ScimError> {
    if value.contains('\'') {
        return Err(ScimError::validation(field, format!("'{value}' contains a quote")));
    }
    Ok(format!("{attribute} eq '{value}'"))
}

/// Identity operations the provisioner needs.
///
/// Implemented by [`ScimClient`] and by fakes in tests.
#[allow(async_fn_in_trait)] // Internal use only
#[cfg_attr(test, mockall::automock)]
pub trait IdentityApi {
    /// First group whose display name equals `name`
    async fn find_group_by_name(&self, name: &str) -> Result<Option<ScimGroup>, ScimError>;

    async fn create_group(&self, name: &str) -> Result<ScimGroup, ScimError>;

    /// First user whose email equals `email`
    async fn find_user_by_email(&self, email: &str) -> Result<Option<ScimUser>, ScimError>;

    async fn create_user(&self, user: &NewUser) -> Result<ScimUser, ScimError>;

    /// Add one user to a group's members
    async fn add_member(&self, group_id: &str, user_id: &str) -> Result<(), ScimError>;
}

/// SCIM client authenticated with a bearer token
pub struct ScimClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ScimClient {
    pub fn new(settings: &ScimSettings) -> Result<Self, ScimError> {
        let base_url = format!(
            "{}/{}",
            settings.host.trim_end_matches('/'),
            settings.api_path.trim_matches('/')
        );
        let http = Client::builder()
            .user_agent(concat!("dbx-provision/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ScimError::Transport {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            base_url,
            token: settings.token.clone(),
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(&self.token)
    }

    /// Send a request and return the body text of a success response
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<String, ScimError> {
        let response = request.send().await.map_err(|source| ScimError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ScimError::Transport {
            url: url.to_string(),
            source,
        })?;
        debug!(url = %url, status = %status, "SCIM response");

        match status {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(body),
            _ => Err(ScimError::from_status(url, status, body)),
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, ScimError> {
        let body = self.send(request, url).await?;
        serde_json::from_str(&body).map_err(|source| ScimError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn find_first<T: DeserializeOwned>(
        &self,
        resource: &str,
        filter: String,
    ) -> Result<Option<T>, ScimError> {
        let url = self.url(resource);
        let request = self
            .request(Method::GET, &url)
            .query(&[("filter", filter.as_str())]);
        let list: ListResponse<T> = self.send_json(request, &url).await?;
        Ok(list.resources.into_iter().next())
    }
}

impl IdentityApi for ScimClient {
    async fn find_group_by_name(&self, name: &str) -> Result<Option<ScimGroup>, ScimError> {
        let filter = eq_filter("displayName", "group name", name)?;
        self.find_first("Groups", filter).await
    }

    async fn create_group(&self, name: &str) -> Result<ScimGroup, ScimError> {
        let url = self.url("Groups");
        let request = self.request(Method::POST, &url).json(&NewGroup::new(name));
        self.send_json(request, &url).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<ScimUser>, ScimError> {
        let filter = eq_filter("email", "email", email)?;
        self.find_first("Users", filter).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<ScimUser, ScimError> {
        let url = self.url("Users");
        let request = self.request(Method::POST, &url).json(user);
        self.send_json(request, &url).await
    }

    async fn add_member(&self, group_id: &str, user_id: &str) -> Result<(), ScimError> {
        let url = self.url(&format!("Groups/{group_id}"));
        let request = self
            .request(Method::PATCH, &url)
            .json(&PatchOp::add_members([user_id]));
        self.send(request, &url).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbx_provision_common::PersonName;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API: &str = "/api/2.0/preview/scim/v2";

    fn client(server: &MockServer) -> ScimClient {
        ScimClient::new(&ScimSettings {
            host: format!("{}/", server.uri()),
            token: "dapi-test".to_string(),
            api_path: "api/2.0/preview/scim/v2".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_eq_filter() {
        assert_eq!(
            eq_filter("email", "email", "a@b.com").unwrap(),
            "email eq 'a@b.com'"
        );
        assert!(matches!(
            eq_filter("displayName", "group name", "o'neil"),
            Err(ScimError::Validation { field: "group name", .. })
        ));
    }

    #[tokio::test]
    async fn test_find_group_sends_filter_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{API}/Groups")))
            .and(query_param("filter", "displayName eq 'data-eng'"))
            .and(header("authorization", "Bearer dapi-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalResults": 1,
                "Resources": [{"id": "g-1", "displayName": "data-eng", "members": [{"value": "u-9"}]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let group = client(&server)
            .find_group_by_name("data-eng")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(group.id, "g-1");
        assert!(group.has_member("u-9"));
    }

    #[tokio::test]
    async fn test_find_user_none_when_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{API}/Users")))
            .and(query_param("filter", "email eq 'new@example.com'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalResults": 0})))
            .mount(&server)
            .await;

        let user = client(&server)
            .find_user_by_email("new@example.com")
            .await
            .unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_create_group_and_user_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{API}/Groups")))
            .and(body_json(json!({"displayName": "data-eng"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "g-2", "displayName": "data-eng"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let new_user = NewUser::new("jane@example.com", &PersonName::from_email("jane@example.com"));
        Mock::given(method("POST"))
            .and(path(format!("{API}/Users")))
            .and(body_json(serde_json::to_value(&new_user).unwrap()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "u-2",
                "userName": "jane@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let c = client(&server);
        let group = c.create_group("data-eng").await.unwrap();
        assert_eq!(group.id, "g-2");
        assert!(group.members.is_empty());

        let user = c.create_user(&new_user).await.unwrap();
        assert_eq!(user.id, "u-2");
    }

    #[tokio::test]
    async fn test_add_member_patch() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(format!("{API}/Groups/g-1")))
            .and(body_json(serde_json::to_value(PatchOp::add_members(["u-1"])).unwrap()))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).add_member("g-1", "u-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{API}/Users")))
            .respond_with(ResponseTemplate::new(409).set_body_string("user exists"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{API}/Groups")))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{API}/Groups")))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let c = client(&server);
        let user = NewUser::new("a@b.com", &PersonName::from_email("a@b.com"));
        assert!(matches!(
            c.create_user(&user).await,
            Err(ScimError::Conflict { .. })
        ));
        assert!(matches!(
            c.create_group("x").await,
            Err(ScimError::Status { status: StatusCode::FORBIDDEN, .. })
        ));
        assert!(matches!(
            c.find_group_by_name("x").await,
            Err(ScimError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let c = ScimClient::new(&ScimSettings {
            host: "http://127.0.0.1:1".to_string(),
            token: "t".to_string(),
            api_path: "scim".to_string(),
        })
        .unwrap();
        assert!(matches!(
            c.create_group("x").await,
            Err(ScimError::Transport { .. })
        ));
    }
}
