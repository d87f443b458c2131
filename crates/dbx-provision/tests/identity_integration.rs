//! Identity provisioning against the in-memory backend
//!
//! Exercises the full roster-to-report path through the public API with a
//! call-recording fake, so call counts and ordering can be asserted exactly.

use dbx_provision::provision::{
    IdentityProvisioner, LocalCsv, RowResult, S3Csv, UserAction, provision_from_source,
};
use dbx_provision_common::{ObjectRef, Roster, RosterError};
use dbx_provision_test_utils::roster::{
    THREE_USERS, WITH_EXTRA_COLUMNS, WITH_INVALID_EMAILS, write_roster,
};
use dbx_provision_test_utils::{Call, FakeIdentityApi, InMemoryObjectStore};

#[tokio::test]
async fn test_one_group_three_users_one_existing() {
    let api = FakeIdentityApi::new().with_user("existing@example.com");
    let existing_id = api.user_id("existing@example.com").unwrap();
    let file = write_roster(THREE_USERS);

    let report = provision_from_source(&LocalCsv::new(file.path()), &api)
        .await
        .unwrap();

    let calls = api.calls();
    let count = |f: fn(&Call) -> bool| calls.iter().filter(|c| f(c)).count();
    assert_eq!(count(|c| matches!(c, Call::FindGroup(_))), 1);
    assert_eq!(count(|c| matches!(c, Call::CreateGroup(_))), 1);
    assert_eq!(count(|c| matches!(c, Call::FindUser(_))), 3);
    assert_eq!(count(|c| matches!(c, Call::CreateUser(_))), 2);
    assert_eq!(count(|c| matches!(c, Call::AddMember { .. })), 3);

    // Users are resolved and added strictly in row order
    let order: Vec<&Call> = calls
        .iter()
        .filter(|c| matches!(c, Call::FindUser(_) | Call::AddMember { .. }))
        .collect();
    assert_eq!(order[0], &Call::FindUser("john.doe@example.com".to_string()));
    assert_eq!(order[2], &Call::FindUser("existing@example.com".to_string()));
    assert_eq!(order[4], &Call::FindUser("jane@example.com".to_string()));
    assert_eq!(
        order[3],
        &Call::AddMember {
            group_id: report.group_id.clone(),
            user_id: existing_id,
        }
    );

    assert!(report.group_created);
    assert!(report.is_complete());
    let summary = report.summary();
    assert_eq!(summary.users_created, 2);
    assert_eq!(summary.users_existing, 1);
    assert_eq!(summary.members_added, 3);

    let group = api.group("data-eng").unwrap();
    assert_eq!(group.members.len(), 3);
}

#[tokio::test]
async fn test_second_run_creates_nothing() {
    let api = FakeIdentityApi::new();
    let roster = Roster::from_csv_str(THREE_USERS).unwrap();
    let provisioner = IdentityProvisioner::new(&api);

    provisioner.provision(&roster).await.unwrap();
    let first_calls = api.calls().len();
    let report = provisioner.provision(&roster).await.unwrap();

    assert_eq!(api.group_count(), 1);
    assert_eq!(api.user_count(), 3);
    assert!(!report.group_created);
    assert!(report
        .rows
        .iter()
        .all(|r| matches!(r.result, RowResult::AlreadyMember { user: UserAction::Existing, .. })));

    // Second run: one group lookup and three user lookups, nothing else
    let second: Vec<Call> = api.calls().split_off(first_calls);
    assert_eq!(second.len(), 4);
    assert!(second
        .iter()
        .all(|c| matches!(c, Call::FindGroup(_) | Call::FindUser(_))));
}

#[tokio::test]
async fn test_existing_group_is_reused() {
    let api = FakeIdentityApi::new().with_group("analysts", &[]);
    let file = write_roster(WITH_EXTRA_COLUMNS);

    let report = provision_from_source(&LocalCsv::new(file.path()), &api)
        .await
        .unwrap();

    assert!(!report.group_created);
    assert_eq!(report.group_name, "analysts");
    assert!(!api.calls().iter().any(|c| matches!(c, Call::CreateGroup(_))));
    assert_eq!(report.rows[0].email, "ann.lee@example.com");
}

#[tokio::test]
async fn test_invalid_emails_make_no_calls() {
    let api = FakeIdentityApi::new();
    let roster = Roster::from_csv_str(WITH_INVALID_EMAILS).unwrap();

    let report = IdentityProvisioner::new(&api).provision(&roster).await.unwrap();

    assert!(matches!(report.rows[0].result, RowResult::Invalid { .. }));
    assert!(matches!(report.rows[1].result, RowResult::Invalid { .. }));
    assert!(matches!(report.rows[2].result, RowResult::Added { user: UserAction::Created, .. }));
    let user_calls: Vec<Call> = api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::FindUser(_) | Call::CreateUser(_)))
        .collect();
    assert_eq!(
        user_calls,
        vec![
            Call::FindUser("ok.user@example.com".to_string()),
            Call::CreateUser("ok.user@example.com".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_user_failure_skips_only_that_row() {
    let api = FakeIdentityApi::new().failing_for("existing@example.com");
    let roster = Roster::from_csv_str(THREE_USERS).unwrap();

    let report = IdentityProvisioner::new(&api).provision(&roster).await.unwrap();

    assert!(matches!(report.rows[0].result, RowResult::Added { .. }));
    assert!(matches!(report.rows[1].result, RowResult::Failed { .. }));
    assert!(matches!(report.rows[2].result, RowResult::Added { .. }));
    assert_eq!(report.summary().failed, 1);
}

#[tokio::test]
async fn test_group_failure_stops_before_users() {
    let api = FakeIdentityApi::new().failing_group_create();
    let roster = Roster::from_csv_str(THREE_USERS).unwrap();

    assert!(IdentityProvisioner::new(&api).provision(&roster).await.is_err());
    assert_eq!(
        api.calls(),
        vec![
            Call::FindGroup("data-eng".to_string()),
            Call::CreateGroup("data-eng".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_roster_from_object_store() {
    let store = InMemoryObjectStore::new().with_object("s3://rosters/team.csv", THREE_USERS);
    let api = FakeIdentityApi::new();

    let object: ObjectRef = "rosters/team.csv".parse().unwrap();
    let report = provision_from_source(&S3Csv::new(&store, object), &api)
        .await
        .unwrap();

    assert_eq!(store.reads(), vec!["s3://rosters/team.csv".to_string()]);
    assert_eq!(report.rows.len(), 3);
}

#[tokio::test]
async fn test_blank_group_name_makes_no_calls() {
    let api = FakeIdentityApi::new();
    let file = write_roster("Group Name,User Email\n ,a@example.com\n");

    let err = provision_from_source(&LocalCsv::new(file.path()), &api)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<RosterError>(),
        Some(RosterError::EmptyGroupName)
    ));
    assert!(api.calls().is_empty());
}
