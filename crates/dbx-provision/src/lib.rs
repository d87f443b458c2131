//! dbx-provision - Databricks on AWS workspace provisioning
//!
//! Creates the network, bucket and IAM wiring a Databricks workspace needs and
//! provisions SCIM users and groups from a CSV roster.

pub mod aws;
pub mod config;
pub mod provision;
pub mod scim;
pub mod wait;
