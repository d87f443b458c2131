//! Workspace network: VPC, two subnets and a security group

use crate::aws::ec2::{Ec2Operations, IngressRule, IngressSource};
use crate::config::NetworkSettings;
use anyhow::{Context, Result};
use dbx_provision_common::defaults::{
    CLUSTER_PORT_MAX, CLUSTER_PORT_MIN, REQUIRED_ZONES, SUBNET_CIDRS, VPC_CIDR,
};
use dbx_provision_common::keys;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Name prefix for the VPC and subnet `Name` tags
const NAME_PREFIX: &str = "databricks-workspace";

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Need at least {required} available zones in the region, found {found}")]
    InsufficientZones { required: usize, found: usize },
}

/// A subnet created for the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetInfo {
    pub subnet_id: String,
    pub zone: String,
    pub cidr: String,
}

/// Identifiers of everything the network step created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkResources {
    pub vpc_id: String,
    pub subnets: Vec<SubnetInfo>,
    pub security_group_id: String,
}

impl NetworkResources {
    /// Config store entries to merge after a successful run
    pub fn env_updates(&self) -> Vec<(&'static str, String)> {
        let mut updates = vec![(keys::VPC_ID, self.vpc_id.clone())];
        updates.extend(
            keys::SUBNET_KEYS
                .iter()
                .zip(&self.subnets)
                .map(|(key, subnet)| (*key, subnet.subnet_id.clone())),
        );
        updates.push((keys::SECURITY_GROUP_ID, self.security_group_id.clone()));
        updates
    }
}

/// Ingress rules Databricks clusters need: all TCP and UDP between cluster
/// nodes on the high ports, plus all traffic from anywhere.
pub fn databricks_ingress_rules() -> Vec<IngressRule> {
    vec![
        IngressRule {
            protocol: "tcp".to_string(),
            from_port: CLUSTER_PORT_MIN,
            to_port: CLUSTER_PORT_MAX,
            source: IngressSource::SelfGroup,
        },
        IngressRule {
            protocol: "udp".to_string(),
            from_port: CLUSTER_PORT_MIN,
            to_port: CLUSTER_PORT_MAX,
            source: IngressSource::SelfGroup,
        },
        IngressRule {
            protocol: "-1".to_string(),
            from_port: 0,
            to_port: CLUSTER_PORT_MAX,
            source: IngressSource::Cidr("0.0.0.0/0".to_string()),
        },
    ]
}

/// Create the workspace network.
///
/// Zones are checked before anything is created. There is no rollback: if a
/// later step fails, the resources created so far are logged and left in place.
#[instrument(skip_all, fields(security_group = %settings.security_group_name))]
pub async fn provision_network<E: Ec2Operations>(
    ec2: &E,
    settings: &NetworkSettings,
) -> Result<NetworkResources> {
    let mut created = Vec::new();
    let result = create_network(ec2, settings, &mut created).await;
    if result.is_err() && !created.is_empty() {
        warn!(created = ?created, "Network provisioning failed; these resources were left in place");
    }
    result
}

async fn create_network<E: Ec2Operations>(
    ec2: &E,
    settings: &NetworkSettings,
    created: &mut Vec<String>,
) -> Result<NetworkResources> {
    let zones = ec2
        .availability_zones()
        .await
        .context("Failed to list availability zones")?;
    if zones.len() < REQUIRED_ZONES {
        return Err(NetworkError::InsufficientZones {
            required: REQUIRED_ZONES,
            found: zones.len(),
        }
        .into());
    }

    let vpc_id = ec2
        .create_vpc(VPC_CIDR, &format!("{NAME_PREFIX}-vpc"))
        .await
        .context("Step 'create VPC' failed")?;
    created.push(vpc_id.clone());

    ec2.enable_dns_support(&vpc_id)
        .await
        .context("Step 'enable DNS support' failed")?;

    let mut subnets = Vec::with_capacity(REQUIRED_ZONES);
    for (i, (cidr, zone)) in SUBNET_CIDRS.iter().zip(&zones).enumerate() {
        let subnet_id = ec2
            .create_subnet(&vpc_id, cidr, zone, &format!("{NAME_PREFIX}-subnet-{}", i + 1))
            .await
            .with_context(|| format!("Step 'create subnet {cidr}' failed"))?;
        created.push(subnet_id.clone());
        subnets.push(SubnetInfo {
            subnet_id,
            zone: zone.clone(),
            cidr: cidr.to_string(),
        });
    }

    let security_group_id = ec2
        .create_security_group(
            &settings.security_group_name,
            &settings.security_group_description,
            &vpc_id,
        )
        .await
        .context("Step 'create security group' failed")?;
    created.push(security_group_id.clone());

    ec2.authorize_ingress(&security_group_id, databricks_ingress_rules())
        .await
        .context("Step 'authorize ingress rules' failed")?;

    info!(
        vpc_id = %vpc_id,
        security_group_id = %security_group_id,
        subnets = subnets.len(),
        "Network provisioned"
    );

    Ok(NetworkResources {
        vpc_id,
        subnets,
        security_group_id,
    })
}
