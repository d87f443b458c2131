//! dbx-provision-common - Shared types and utilities
//!
//! This crate provides the pieces shared by the CLI and the Lambda function,
//! without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`defaults`]: Fixed network layout, policy constants and fallbacks
//! - [`env_file`]: The `KEY=VALUE` config store shared between commands
//! - [`keys`]: Well-known config store keys
//! - [`names`]: Given/family name derivation from an email address
//! - [`object_ref`]: `s3://bucket/key` object references
//! - [`roster`]: Group/user rows loaded from CSV

pub mod defaults;
pub mod env_file;
pub mod keys;
pub mod names;
pub mod object_ref;
pub mod roster;

// Re-export commonly used types
pub use env_file::{EnvFile, EnvFileError};
pub use names::PersonName;
pub use object_ref::{ObjectRef, ObjectRefError};
pub use roster::{Roster, RosterError, RosterRow};
