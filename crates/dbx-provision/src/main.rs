//! dbx-provision: Databricks workspace provisioning on AWS
//!
//! Creates the workspace VPC, the root bucket and its policy, wires the bucket
//! into the cross-account role, and provisions SCIM users from a CSV roster.
//! Commands share state through an env file (`.env` by default).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dbx_provision::aws::{
    AwsContext, Ec2Client, IamClient, S3Client, classify_anyhow_error, get_caller_identity,
};
use dbx_provision::config::Settings;
use dbx_provision::provision::{
    LocalCsv, S3Csv, patch_role_policy, print_report, provision_bucket, provision_from_source,
    provision_network,
};
use dbx_provision::scim::ScimClient;
use dbx_provision_common::ObjectRef;
use dbx_provision_common::defaults::DEFAULT_ENV_FILE;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dbx-provision")]
#[command(about = "Provision Databricks workspace networking, storage and users on AWS")]
#[command(version)]
struct Args {
    /// Env file holding credentials and the IDs earlier commands produced
    #[arg(long, global = true, env = "DBX_PROVISION_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// AWS profile to use when the env file has no access keys
    #[arg(long, global = true)]
    aws_profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the workspace VPC, two subnets and the security group
    Network,

    /// Create or reuse the root bucket, apply its policy and patch the role
    Bucket {
        /// Don't patch the cross-account role's inline policy afterwards
        #[arg(long)]
        skip_role_patch: bool,
    },

    /// Add a bucket's ARNs to the cross-account role's inline policy
    PatchRole {
        /// Bucket ARN (default: S3_BUCKET_ARN from the env file)
        #[arg(long)]
        bucket_arn: Option<String>,
    },

    /// Provision a group and its users from a CSV roster
    Users {
        /// Local CSV path or s3://bucket/key
        source: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if let Some(hint) = classify_anyhow_error(e).and_then(|aws| aws.suggestion()) {
        let _ = writeln!(stderr, "\n\x1b[36mHint:\x1b[0m {hint}");
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut settings = Settings::load(&args.env_file)
        .with_context(|| format!("Failed to load {}", args.env_file.display()))?;
    let profile = args.aws_profile.as_deref();

    match args.command {
        Command::Network => handle_network(&mut settings, profile).await,
        Command::Bucket { skip_role_patch } => {
            handle_bucket(&mut settings, profile, skip_role_patch).await
        }
        Command::PatchRole { bucket_arn } => {
            handle_patch_role(&settings, profile, bucket_arn.as_deref()).await
        }
        Command::Users { source } => handle_users(&settings, profile, &source).await,
    }
}

/// Load AWS config and validate the credentials before any other call
async fn connect(settings: &Settings, profile: Option<&str>) -> Result<AwsContext> {
    let aws = AwsContext::from_settings(&settings.aws(profile)?).await;
    let identity = get_caller_identity(aws.sdk_config()).await?;
    info!(account_id = %identity.account, region = %aws.region(), "Connected to AWS");
    Ok(aws)
}

/// Handle the network command
async fn handle_network(settings: &mut Settings, profile: Option<&str>) -> Result<()> {
    let network = settings.network();
    let aws = connect(settings, profile).await?;
    let ec2 = Ec2Client::from_context(&aws);

    let resources = provision_network(&ec2, &network).await?;

    settings.file_mut().merge(resources.env_updates());
    settings.file().save()?;

    println!("VPC:            {}", resources.vpc_id);
    for subnet in &resources.subnets {
        println!("Subnet:         {} ({}, {})", subnet.subnet_id, subnet.zone, subnet.cidr);
    }
    println!("Security group: {}", resources.security_group_id);
    println!("\nIDs written to {}", settings.file().path().display());
    Ok(())
}

/// Handle the bucket command
async fn handle_bucket(
    settings: &mut Settings,
    profile: Option<&str>,
    skip_role_patch: bool,
) -> Result<()> {
    let (bucket, role) = settings.bucket_and_role(!skip_role_patch)?;
    let aws = connect(settings, profile).await?;
    let s3 = S3Client::from_context(&aws);

    let result = provision_bucket(&s3, &bucket, settings.file_mut()).await;
    settings.file().save()?;
    let resources = result?;

    println!(
        "Bucket {} ready ({:?}), ARN {}",
        resources.bucket_name, resources.status, resources.bucket_arn
    );

    let Some(role) = role else {
        return Ok(());
    };

    let iam = IamClient::from_context(&aws);
    let outcome = patch_role_policy(&iam, &role, &resources.bucket_arn).await?;
    println!("Role {}: {outcome}", role.role_name);
    Ok(())
}

/// Handle the patch-role command
async fn handle_patch_role(
    settings: &Settings,
    profile: Option<&str>,
    bucket_arn: Option<&str>,
) -> Result<()> {
    let bucket_arn = match bucket_arn {
        Some(arn) => arn,
        None => settings.bucket_arn()?,
    };
    let role = settings.role()?;
    let aws = connect(settings, profile).await?;
    let iam = IamClient::from_context(&aws);

    let outcome = patch_role_policy(&iam, &role, bucket_arn).await?;
    println!("Role {}: {outcome}", role.role_name);
    Ok(())
}

/// Handle the users command
async fn handle_users(settings: &Settings, profile: Option<&str>, source: &str) -> Result<()> {
    let scim = ScimClient::new(&settings.scim()?)?;

    let report = if ObjectRef::is_s3_url(source) {
        let object: ObjectRef = source.parse()?;
        let aws = connect(settings, profile).await?;
        let s3 = S3Client::from_context(&aws);
        provision_from_source(&S3Csv::new(&s3, object), &scim).await?
    } else {
        provision_from_source(&LocalCsv::new(source), &scim).await?
    };

    print_report(&report);
    Ok(())
}
