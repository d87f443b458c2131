//! Provisioning workflows
//!
//! Each workflow is written against the operation traits in [`crate::aws`]
//! and [`crate::scim`] so it can run against mocks in tests.

pub mod bucket;
pub mod identity;
pub mod network;
pub mod report;
pub mod role;
pub mod source;

pub use bucket::{BucketResources, provision_bucket};
pub use identity::{
    IdentityProvisioner, ProvisionReport, ProvisionSummary, RowOutcome, RowResult, RowStage,
    UserAction, validate_email,
};
pub use network::{NetworkError, NetworkResources, databricks_ingress_rules, provision_network};
pub use report::{print_report, report_table};
pub use role::{PatchError, RolePatchOutcome, patch_role_policy};
pub use source::{LocalCsv, RosterSource, S3Csv, provision_from_source};
