//! SCIM identity API
//!
//! Typed client for the Databricks SCIM endpoints (`Groups`, `Users`) and the
//! [`IdentityApi`] seam the identity provisioner is written against.

pub mod client;
pub mod error;
pub mod types;

pub use client::{IdentityApi, ScimClient, eq_filter};
pub use error::ScimError;
pub use reqwest::StatusCode;
pub use types::{Member, NewUser, PatchOp, ScimGroup, ScimUser};
