//! dbx-provision-lambda: provision SCIM users from a roster in S3
//!
//! Region comes from the Lambda environment; credentials from the execution
//! role. SCIM settings (`DATABRICKS_HOST`, `DATABRICKS_TOKEN`) come from the
//! function's environment variables.

use dbx_provision::aws::{AwsContext, S3Client};
use dbx_provision::config::Settings;
use dbx_provision::scim::ScimClient;
use dbx_provision_common::keys;
use dbx_provision_lambda::{LambdaResponse, ProvisionEvent, handle};
use lambda_runtime::{Error, LambdaEvent, service_fn};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .without_time()
        .with_target(false)
        .init();

    let settings = Settings::from_env();
    let scim = ScimClient::new(&settings.scim()?)?;
    // Execution role credentials, not the keys Lambda exports into the environment
    let aws = AwsContext::new(settings.require(keys::AWS_REGION)?).await;
    let s3 = S3Client::from_context(&aws);

    lambda_runtime::run(service_fn(|event: LambdaEvent<ProvisionEvent>| {
        let (scim, s3) = (&scim, &s3);
        async move { Ok::<LambdaResponse, Error>(handle(event.payload, scim, s3).await) }
    }))
    .await
}
