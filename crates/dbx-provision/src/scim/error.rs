//! SCIM error classification

use reqwest::StatusCode;
use thiserror::Error;

/// Errors from the identity API
#[derive(Debug, Error)]
pub enum ScimError {
    /// 404 from the server
    #[error("{url} not found")]
    NotFound { url: String },

    /// 409 from the server, typically a duplicate natural key
    #[error("Conflict at {url}: {body}")]
    Conflict { url: String, body: String },

    /// Input rejected before any request was sent
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// No response was received
    #[error("Request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Any other non-success status
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    /// The response body did not match the expected shape
    #[error("Failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ScimError {
    /// Classify a non-success response
    pub fn from_status(url: &str, status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::NOT_FOUND => ScimError::NotFound {
                url: url.to_string(),
            },
            StatusCode::CONFLICT => ScimError::Conflict {
                url: url.to_string(),
                body,
            },
            _ => ScimError::Status {
                url: url.to_string(),
                status,
                body,
            },
        }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ScimError::Validation {
            field,
            reason: reason.into(),
        }
    }
}
