//! Default configuration values
//!
//! The network layout and the bucket policy principal are fixed by the
//! Databricks customer-managed VPC requirements, so they live here rather
//! than in the config store.

/// CIDR block of the workspace VPC
pub const VPC_CIDR: &str = "10.210.0.0/16";

/// Subnet CIDRs, one per availability zone, in zone order
pub const SUBNET_CIDRS: [&str; 2] = ["10.210.1.0/24", "10.210.2.0/24"];

/// Number of availability zones the workspace needs
pub const REQUIRED_ZONES: usize = SUBNET_CIDRS.len();

/// Lowest port opened between cluster nodes
pub const CLUSTER_PORT_MIN: i32 = 1025;

/// Highest port opened between cluster nodes
pub const CLUSTER_PORT_MAX: i32 = 65535;

/// Security group name used when the config store has none
pub const DEFAULT_SECURITY_GROUP_NAME: &str = "databricks-workspace-sg";

/// Security group description used when the config store has none
pub const DEFAULT_SECURITY_GROUP_DESCRIPTION: &str = "Databricks workspace security group";

/// Region whose bucket creation call must not carry a location constraint
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Databricks control-plane account granted access in the bucket policy
pub const DATABRICKS_PRINCIPAL_ARN: &str = "arn:aws:iam::414351767826:root";

/// IAM policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// SCIM API path below the workspace host
pub const DEFAULT_SCIM_API_PATH: &str = "api/2.0/preview/scim/v2";

/// Env file used when `--env-file` is not given
pub const DEFAULT_ENV_FILE: &str = ".env";
