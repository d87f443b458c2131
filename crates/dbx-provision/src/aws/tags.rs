//! AWS resource tags for dbx-provision
//!
//! Every EC2 resource the network command creates carries these tags so
//! operators can find what a run left behind.
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `Name` | Human-readable resource name |
//! | `dbx-provision:tool` | Static identifier ("dbx-provision") |
//! | `dbx-provision:created-at` | RFC 3339 creation timestamp |

use aws_sdk_ec2::types::{ResourceType, Tag, TagSpecification};

/// Tag key for tool identification
pub const TAG_TOOL: &str = "dbx-provision:tool";

/// Tag value for tool identification
pub const TAG_TOOL_VALUE: &str = "dbx-provision";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "dbx-provision:created-at";

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339()
}

/// Build an EC2 TagSpecification with the standard tags and a `Name` tag.
pub fn ec2_tag_spec(resource_type: ResourceType, name: &str) -> TagSpecification {
    let created_at = format_created_at(chrono::Utc::now());
    TagSpecification::builder()
        .resource_type(resource_type)
        .tags(Tag::builder().key("Name").value(name).build())
        .tags(Tag::builder().key(TAG_TOOL).value(TAG_TOOL_VALUE).build())
        .tags(
            Tag::builder()
                .key(TAG_CREATED_AT)
                .value(created_at)
                .build(),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_spec_contents() {
        let spec = ec2_tag_spec(ResourceType::Vpc, "databricks-vpc");
        assert_eq!(spec.resource_type(), Some(&ResourceType::Vpc));

        let tags: Vec<(&str, &str)> = spec
            .tags()
            .iter()
            .map(|t| (t.key().unwrap_or_default(), t.value().unwrap_or_default()))
            .collect();
        assert!(tags.contains(&("Name", "databricks-vpc")));
        assert!(tags.contains(&(TAG_TOOL, TAG_TOOL_VALUE)));
        assert!(tags.iter().any(|(k, _)| *k == TAG_CREATED_AT));
    }

    #[test]
    fn test_created_at_is_rfc3339() {
        let ts = format_created_at(chrono::Utc::now());
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
