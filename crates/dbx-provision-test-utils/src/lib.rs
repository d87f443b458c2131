//! Shared test utilities for dbx-provision
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection and unique resource names for integration tests
//! - [`identity`]: In-memory identity backend that records every call
//! - [`roster`]: CSV roster fixtures
//! - [`store`]: In-memory object store

pub mod aws;
pub mod identity;
pub mod roster;
pub mod store;

// Re-export commonly used items
pub use aws::{get_test_region, test_bucket_name, test_run_id};
pub use identity::{Call, FakeIdentityApi};
pub use store::InMemoryObjectStore;
