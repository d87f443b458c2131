//! Config store keys
//!
//! Every value read from or written to the env file goes through one of these
//! constants. The names match the `.env` files operators already keep, which
//! is why a couple of them are not upper case.
//!
//! | Key | Written by | Read by |
//! |-----|------------|---------|
//! | `VPC_ID` | `network` | operator |
//! | `SUBNET_ID1`, `SUBNET_ID2` | `network` | operator |
//! | `SECURITY_GROUP_ID` | `network` | operator |
//! | `S3_BUCKET_ARN` | `bucket` | `patch-role` |

/// AWS access key id (optional, falls back to the default credential chain)
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";

/// AWS secret access key (optional, paired with [`AWS_ACCESS_KEY_ID`])
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

/// AWS region for every SDK client
pub const AWS_REGION: &str = "AWS_REGION";

/// Named AWS profile
pub const AWS_PROFILE: &str = "AWS_PROFILE";

/// Security group name for the workspace VPC
pub const SECURITY_GROUP_NAME: &str = "SECURITY_GROUP_NAME";

/// Security group description for the workspace VPC
pub const SECURITY_GROUP_DESCRIPTION: &str = "SECURITY_GROUP_DESCRIPTION";

/// Created VPC id
pub const VPC_ID: &str = "VPC_ID";

/// Created security group id
pub const SECURITY_GROUP_ID: &str = "SECURITY_GROUP_ID";

/// Created subnet in the first availability zone
pub const SUBNET_ID1: &str = "SUBNET_ID1";

/// Created subnet in the second availability zone
pub const SUBNET_ID2: &str = "SUBNET_ID2";

/// Bucket to create for workspace root storage
pub const S3_BUCKET_NAME: &str = "S3_BUCKET_NAME";

/// ARN of the created bucket
pub const S3_BUCKET_ARN: &str = "S3_BUCKET_ARN";

/// Databricks account id used in the bucket policy condition
pub const DATABRICKS_ACCOUNT_ID: &str = "DATABRICKS_ACCOUNT_ID";

/// Cross-account role whose inline policy gets the bucket ARNs
pub const DATABRICKS_ROLE_NAME: &str = "Databricks_Role_Name";

/// Inline policy name on [`DATABRICKS_ROLE_NAME`]
pub const POLICY_NAME: &str = "Policy_name";

/// Workspace URL, e.g. `https://dbc-1234.cloud.databricks.com`
pub const DATABRICKS_HOST: &str = "DATABRICKS_HOST";

/// Personal access token for the SCIM API
pub const DATABRICKS_TOKEN: &str = "DATABRICKS_TOKEN";

/// SCIM API path below the host
pub const SCIM_API_PATH: &str = "SCIM_API_PATH";

/// Subnet keys in availability zone order
pub const SUBNET_KEYS: [&str; 2] = [SUBNET_ID1, SUBNET_ID2];
