//! Event in, status code and JSON body out

use dbx_provision::aws::ObjectStore;
use dbx_provision::provision::{ProvisionSummary, S3Csv, provision_from_source};
use dbx_provision::scim::IdentityApi;
use dbx_provision_common::ObjectRef;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument};

const MISSING_URL: &str = "S3 URL not provided in the event.";
const SUCCESS: &str = "User processing completed successfully.";

/// Invocation payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisionEvent {
    /// `s3://bucket/key` or `bucket/key`
    #[serde(default)]
    pub s3_url: Option<String>,
}

/// API Gateway style response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LambdaResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-encoded body
    pub body: String,
}

impl LambdaResponse {
    fn new(status_code: u16, body: serde_json::Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self::new(status_code, json!({ "error": message.into() }))
    }

    fn success(summary: ProvisionSummary) -> Self {
        Self::new(200, json!({ "message": SUCCESS, "summary": summary }))
    }
}

/// Load the roster named by the event and provision it.
///
/// Never fails: errors become 400 or 500 responses.
#[instrument(skip_all, fields(s3_url = ?event.s3_url))]
pub async fn handle<A, O>(event: ProvisionEvent, api: &A, store: &O) -> LambdaResponse
where
    A: IdentityApi,
    O: ObjectStore,
{
    let Some(url) = event.s3_url.filter(|u| !u.trim().is_empty()) else {
        return LambdaResponse::error(400, MISSING_URL);
    };

    let object: ObjectRef = match url.parse() {
        Ok(object) => object,
        Err(e) => {
            error!(error = %e, "Invalid S3 URL");
            return LambdaResponse::error(500, e.to_string());
        }
    };

    match provision_from_source(&S3Csv::new(store, object), api).await {
        Ok(report) => {
            let summary = report.summary();
            info!(
                group = %report.group_name,
                added = summary.members_added,
                failed = summary.failed,
                "Roster processed"
            );
            LambdaResponse::success(summary)
        }
        Err(e) => {
            error!(error = ?e, "Roster processing failed");
            LambdaResponse::error(500, format!("{e:#}"))
        }
    }
}
