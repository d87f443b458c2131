//! Lambda adapter for roster provisioning
//!
//! The binary wires real clients into [`handler::handle`]; everything else
//! lives here so it can be driven with in-memory backends.

pub mod handler;

pub use handler::{LambdaResponse, ProvisionEvent, handle};
