//! Where rosters come from

use crate::aws::s3::ObjectStore;
use crate::provision::identity::{IdentityProvisioner, ProvisionReport};
use crate::scim::IdentityApi;
use anyhow::{Context, Result};
use dbx_provision_common::{ObjectRef, Roster};
use std::path::PathBuf;
use tracing::info;

/// A roster CSV location
#[allow(async_fn_in_trait)] // Internal use only
pub trait RosterSource {
    /// Human-readable location, for logs and errors
    fn describe(&self) -> String;

    async fn load(&self) -> Result<Roster>;
}

/// CSV file on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalCsv {
    path: PathBuf,
}

impl LocalCsv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RosterSource for LocalCsv {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Roster> {
        Ok(Roster::load(&self.path)?)
    }
}

/// CSV object in S3
pub struct S3Csv<'a, O> {
    store: &'a O,
    object: ObjectRef,
}

impl<'a, O: ObjectStore> S3Csv<'a, O> {
    pub fn new(store: &'a O, object: ObjectRef) -> Self {
        Self { store, object }
    }
}

impl<O: ObjectStore> RosterSource for S3Csv<'_, O> {
    fn describe(&self) -> String {
        self.object.to_string()
    }

    async fn load(&self) -> Result<Roster> {
        let text = self.store.get_object_text(&self.object).await?;
        Ok(Roster::from_csv_str(&text)?)
    }
}

/// Load a roster and provision it
pub async fn provision_from_source<S, A>(source: &S, api: &A) -> Result<ProvisionReport>
where
    S: RosterSource,
    A: IdentityApi,
{
    let roster = source
        .load()
        .await
        .with_context(|| format!("Failed to load roster from {}", source.describe()))?;
    info!(source = %source.describe(), group = %roster.group_name(), rows = roster.len(), "Roster loaded");

    let report = IdentityProvisioner::new(api)
        .provision(&roster)
        .await
        .with_context(|| format!("Failed to resolve group '{}'", roster.group_name()))?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::s3::MockObjectStore;
    use crate::scim::client::MockIdentityApi;
    use crate::scim::{ScimGroup, ScimUser};
    use dbx_provision_common::RosterError;
    use std::io::Write;

    #[tokio::test]
    async fn test_local_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Group Name,User Email,Team").unwrap();
        writeln!(file, " eng , a@example.com ,x").unwrap();
        let roster = LocalCsv::new(file.path()).load().await.unwrap();
        assert_eq!(roster.group_name(), "eng");
        assert_eq!(roster.rows()[0].user_email, "a@example.com");
    }

    #[tokio::test]
    async fn test_local_csv_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalCsv::new(dir.path().join("nope.csv")).load().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RosterError>(),
            Some(RosterError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_s3_csv_reads_object() {
        let mut store = MockObjectStore::new();
        store
            .expect_get_object_text()
            .withf(|o| o.bucket == "rosters" && o.key == "eng.csv")
            .times(1)
            .returning(|_| Ok("Group Name,User Email\neng,a@example.com\n".to_string()));

        let source = S3Csv::new(&store, "s3://rosters/eng.csv".parse().unwrap());
        assert_eq!(source.describe(), "s3://rosters/eng.csv");
        assert_eq!(source.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_provision_from_source() {
        let mut store = MockObjectStore::new();
        store
            .expect_get_object_text()
            .returning(|_| Ok("Group Name,User Email\neng,a@example.com\n".to_string()));

        let mut api = MockIdentityApi::new();
        api.expect_find_group_by_name().returning(|_| {
            Ok(Some(ScimGroup {
                id: "g-1".to_string(),
                display_name: "eng".to_string(),
                members: Vec::new(),
            }))
        });
        api.expect_find_user_by_email().returning(|email| {
            Ok(Some(ScimUser {
                id: "u-1".to_string(),
                user_name: email.to_string(),
                name: None,
                emails: Vec::new(),
            }))
        });
        api.expect_add_member().times(1).returning(|_, _| Ok(()));

        let source = S3Csv::new(&store, ObjectRef::new("rosters", "eng.csv"));
        let report = provision_from_source(&source, &api).await.unwrap();
        assert_eq!(report.group_id, "g-1");
        assert_eq!(report.summary().members_added, 1);
    }

    #[tokio::test]
    async fn test_load_failure_names_source() {
        let mut store = MockObjectStore::new();
        store
            .expect_get_object_text()
            .returning(|_| Err(anyhow::anyhow!("NoSuchKey")));
        let api = MockIdentityApi::new();

        let source = S3Csv::new(&store, ObjectRef::new("rosters", "missing.csv"));
        let err = provision_from_source(&source, &api).await.unwrap_err();
        assert!(err.to_string().contains("s3://rosters/missing.csv"));
    }
}
