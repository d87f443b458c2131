//! EC2 network resource management

use crate::aws::context::AwsContext;
use crate::aws::error::AwsError;
use crate::aws::tags;
use crate::wait::{WaitConfig, wait_for_resource};
use anyhow::{Context, Result};
use aws_sdk_ec2::{
    Client,
    types::{
        AttributeBooleanValue, Filter, IpPermission, IpRange, ResourceType, UserIdGroupPair,
        VpcState,
    },
};
use tracing::{debug, info};

/// Where an ingress rule admits traffic from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressSource {
    /// Members of the security group the rule belongs to
    SelfGroup,
    /// An IPv4 CIDR block
    Cidr(String),
}

/// One security group ingress rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRule {
    /// `tcp`, `udp` or `-1` for all traffic
    pub protocol: String,
    pub from_port: i32,
    pub to_port: i32,
    pub source: IngressSource,
}

impl IngressRule {
    /// Convert to the SDK permission, resolving `SelfGroup` to `group_id`
    pub fn to_permission(&self, group_id: &str) -> IpPermission {
        let builder = IpPermission::builder()
            .ip_protocol(&self.protocol)
            .from_port(self.from_port)
            .to_port(self.to_port);

        match &self.source {
            IngressSource::SelfGroup => builder
                .user_id_group_pairs(UserIdGroupPair::builder().group_id(group_id).build())
                .build(),
            IngressSource::Cidr(cidr) => builder
                .ip_ranges(IpRange::builder().cidr_ip(cidr).build())
                .build(),
        }
    }
}

/// EC2 client for managing the workspace network
pub struct Ec2Client {
    client: Client,
}

impl Ec2Client {
    /// Create a new EC2 client (loads AWS config from environment)
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    /// Create an EC2 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }

    /// Names of the availability zones currently available in the region
    pub async fn availability_zones(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .describe_availability_zones()
            .filters(Filter::builder().name("state").values("available").build())
            .send()
            .await
            .map_err(AwsError::from_sdk)
            .context("Failed to describe availability zones")?;

        let zones: Vec<String> = response
            .availability_zones()
            .iter()
            .filter_map(|az| az.zone_name())
            .map(str::to_string)
            .collect();

        debug!(zones = ?zones, "Found availability zones");
        Ok(zones)
    }

    /// Create a VPC and wait until it is available
    pub async fn create_vpc(&self, cidr: &str, name: &str) -> Result<String> {
        info!(cidr = %cidr, name = %name, "Creating VPC");

        let response = self
            .client
            .create_vpc()
            .cidr_block(cidr)
            .tag_specifications(tags::ec2_tag_spec(ResourceType::Vpc, name))
            .send()
            .await
            .map_err(AwsError::from_sdk)
            .context("Failed to create VPC")?;

        let vpc_id = response
            .vpc()
            .and_then(|v| v.vpc_id())
            .context("No VPC ID in response")?
            .to_string();

        let client = self.client.clone();
        let id = vpc_id.clone();
        wait_for_resource(
            WaitConfig::default(),
            || {
                let c = client.clone();
                let id = id.clone();
                async move {
                    let response = c
                        .describe_vpcs()
                        .vpc_ids(&id)
                        .send()
                        .await
                        .map_err(AwsError::from_sdk)?;
                    Ok(response
                        .vpcs()
                        .first()
                        .and_then(|v| v.state())
                        .is_some_and(|s| *s == VpcState::Available))
                }
            },
            "VPC",
        )
        .await?;

        info!(vpc_id = %vpc_id, "VPC available");
        Ok(vpc_id)
    }

    /// Enable DNS resolution inside the VPC
    pub async fn enable_dns_support(&self, vpc_id: &str) -> Result<()> {
        self.client
            .modify_vpc_attribute()
            .vpc_id(vpc_id)
            .enable_dns_support(AttributeBooleanValue::builder().value(true).build())
            .send()
            .await
            .map_err(AwsError::from_sdk)
            .context("Failed to enable DNS support")?;

        debug!(vpc_id = %vpc_id, "DNS support enabled");
        Ok(())
    }

    /// Create a subnet in one availability zone
    pub async fn create_subnet(
        &self,
        vpc_id: &str,
        cidr: &str,
        zone: &str,
        name: &str,
    ) -> Result<String> {
        let response = self
            .client
            .create_subnet()
            .vpc_id(vpc_id)
            .cidr_block(cidr)
            .availability_zone(zone)
            .tag_specifications(tags::ec2_tag_spec(ResourceType::Subnet, name))
            .send()
            .await
            .map_err(AwsError::from_sdk)
            .with_context(|| format!("Failed to create subnet {cidr} in {zone}"))?;

        let subnet_id = response
            .subnet()
            .and_then(|s| s.subnet_id())
            .context("No subnet ID in response")?
            .to_string();

        info!(subnet_id = %subnet_id, zone = %zone, cidr = %cidr, "Created subnet");
        Ok(subnet_id)
    }

    /// Create a security group scoped to a VPC
    pub async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: &str,
    ) -> Result<String> {
        info!(name = %name, vpc_id = %vpc_id, "Creating security group");

        let response = self
            .client
            .create_security_group()
            .group_name(name)
            .description(description)
            .vpc_id(vpc_id)
            .tag_specifications(tags::ec2_tag_spec(ResourceType::SecurityGroup, name))
            .send()
            .await
            .map_err(AwsError::from_sdk)
            .context("Failed to create security group")?;

        let sg_id = response
            .group_id()
            .context("No security group ID in response")?
            .to_string();

        info!(sg_id = %sg_id, "Created security group");
        Ok(sg_id)
    }

    /// Authorize ingress rules on a security group in one call
    pub async fn authorize_ingress(&self, group_id: &str, rules: &[IngressRule]) -> Result<()> {
        let mut request = self
            .client
            .authorize_security_group_ingress()
            .group_id(group_id);
        for rule in rules {
            request = request.ip_permissions(rule.to_permission(group_id));
        }

        request
            .send()
            .await
            .map_err(AwsError::from_sdk)
            .context("Failed to add ingress rules to security group")?;

        info!(sg_id = %group_id, rules = rules.len(), "Ingress rules authorized");
        Ok(())
    }
}

/// Trait for EC2 operations that can be mocked in tests.
///
/// This trait abstracts the EC2 client operations to enable unit testing
/// of the network workflow without hitting real AWS.
#[allow(async_fn_in_trait)] // Internal use only
#[cfg_attr(test, mockall::automock)]
pub trait Ec2Operations {
    /// Available zone names in the region
    async fn availability_zones(&self) -> Result<Vec<String>>;

    /// Create a VPC and wait for it to become available
    async fn create_vpc(&self, cidr: &str, name: &str) -> Result<String>;

    /// Enable DNS support on a VPC
    async fn enable_dns_support(&self, vpc_id: &str) -> Result<()>;

    /// Create a subnet
    async fn create_subnet(
        &self,
        vpc_id: &str,
        cidr: &str,
        zone: &str,
        name: &str,
    ) -> Result<String>;

    /// Create a security group
    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: &str,
    ) -> Result<String>;

    /// Authorize ingress rules
    async fn authorize_ingress(&self, group_id: &str, rules: Vec<IngressRule>) -> Result<()>;
}

impl Ec2Operations for Ec2Client {
    async fn availability_zones(&self) -> Result<Vec<String>> {
        Ec2Client::availability_zones(self).await
    }

    async fn create_vpc(&self, cidr: &str, name: &str) -> Result<String> {
        Ec2Client::create_vpc(self, cidr, name).await
    }

    async fn enable_dns_support(&self, vpc_id: &str) -> Result<()> {
        Ec2Client::enable_dns_support(self, vpc_id).await
    }

    async fn create_subnet(
        &self,
        vpc_id: &str,
        cidr: &str,
        zone: &str,
        name: &str,
    ) -> Result<String> {
        Ec2Client::create_subnet(self, vpc_id, cidr, zone, name).await
    }

    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: &str,
    ) -> Result<String> {
        Ec2Client::create_security_group(self, name, description, vpc_id).await
    }

    async fn authorize_ingress(&self, group_id: &str, rules: Vec<IngressRule>) -> Result<()> {
        Ec2Client::authorize_ingress(self, group_id, &rules).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_group_rule_references_group() {
        let rule = IngressRule {
            protocol: "tcp".to_string(),
            from_port: 1025,
            to_port: 65535,
            source: IngressSource::SelfGroup,
        };
        let perm = rule.to_permission("sg-123");
        assert_eq!(perm.ip_protocol(), Some("tcp"));
        assert_eq!(perm.from_port(), Some(1025));
        assert_eq!(perm.to_port(), Some(65535));
        assert_eq!(perm.user_id_group_pairs()[0].group_id(), Some("sg-123"));
        assert!(perm.ip_ranges().is_empty());
    }

    #[test]
    fn test_cidr_rule() {
        let rule = IngressRule {
            protocol: "-1".to_string(),
            from_port: 0,
            to_port: 65535,
            source: IngressSource::Cidr("0.0.0.0/0".to_string()),
        };
        let perm = rule.to_permission("sg-123");
        assert_eq!(perm.ip_ranges()[0].cidr_ip(), Some("0.0.0.0/0"));
        assert!(perm.user_id_group_pairs().is_empty());
    }
}
