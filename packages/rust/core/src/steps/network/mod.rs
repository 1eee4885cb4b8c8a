//! Virtual networks, subnets, interfaces, public IPs, security groups and
//! load balancers.

pub mod constants;
pub mod converters;

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{info, warn};

use cloudgraph_client::network::NetworkInterface;
use cloudgraph_shared::{CloudGraphError, RawData, RelationshipSchema, Result};

use crate::job_state::{JobState, LinkOutcome};
use crate::registry::{BoxFuture, Step, StepContext};
use crate::resource_id::network_interface_id;
use crate::steps::active_directory::STEP_AD_ACCOUNT;
use crate::steps::resources::{STEP_RM_RESOURCES_RESOURCE_GROUPS, link_resource_group};
use crate::steps::web_linker;

pub use self::constants::*;
use self::converters::*;

/// Link `from_key` to the entity whose key matches `target_id`, ignoring case.
fn link_by_id(
    state: &mut JobState,
    schema: &RelationshipSchema,
    from_key: &str,
    target_id: &str,
) -> Result<LinkOutcome> {
    let target_key = state
        .find_entity_ignore_case(target_id)
        .map(|target| target.key.clone())
        .unwrap_or_else(|| target_id.to_string());
    state.link(schema.create(from_key, &target_key))
}

fn fetch_network_interfaces<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let count = client
            .iterate_network_interfaces(|nic| {
                let key = state
                    .add_entity(create_network_interface_entity(&linker, &nic)?)?
                    .key
                    .clone();
                link_resource_group(state, &key)?;
                Ok(())
            })
            .await?;

        info!(count, "network interfaces ingested");
        Ok(())
    })
}

fn fetch_public_ip_addresses<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let count = client
            .iterate_public_ip_addresses(|address| {
                let key = state
                    .add_entity(create_public_ip_address_entity(&linker, &address)?)?
                    .key
                    .clone();
                link_resource_group(state, &key)?;
                Ok(())
            })
            .await?;

        info!(count, "public IP addresses ingested");
        Ok(())
    })
}

fn fetch_virtual_networks<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let count = client
            .iterate_virtual_networks(|vnet| {
                let vnet_entity = create_virtual_network_entity(&linker, &vnet)?;
                let vnet_key = state.add_entity(vnet_entity)?.key.clone();
                link_resource_group(state, &vnet_key)?;

                for subnet in &vnet.properties.subnets {
                    let subnet_entity = create_subnet_entity(&linker, &vnet, subnet)?;
                    let subnet_key = state.add_entity(subnet_entity)?.key.clone();
                    state.add_relationship(
                        VIRTUAL_NETWORK_CONTAINS_SUBNET.create(&vnet_key, &subnet_key),
                    )?;
                    link_resource_group(state, &subnet_key)?;
                }
                Ok(())
            })
            .await?;

        info!(count, "virtual networks ingested");
        Ok(())
    })
}

fn fetch_network_security_groups<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let count = client
            .iterate_network_security_groups(|nsg| {
                let key = state
                    .add_entity(create_network_security_group_entity(&linker, &nsg)?)?
                    .key
                    .clone();
                link_resource_group(state, &key)?;

                let mut seen = HashSet::new();
                let subnet_ids = nsg.properties.subnets.iter().filter_map(|s| s.id.as_deref());
                for subnet_id in subnet_ids.filter(|id| seen.insert(id.to_lowercase())) {
                    link_by_id(state, &SECURITY_GROUP_PROTECTS_SUBNET, &key, subnet_id)?;
                }
                let nic_ids = nsg
                    .properties
                    .network_interfaces
                    .iter()
                    .filter_map(|n| n.id.as_deref());
                for nic_id in nic_ids.filter(|id| seen.insert(id.to_lowercase())) {
                    link_by_id(state, &SECURITY_GROUP_PROTECTS_NIC, &key, nic_id)?;
                }
                Ok(())
            })
            .await?;

        info!(count, "network security groups ingested");
        Ok(())
    })
}

fn fetch_load_balancers<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let count = client
            .iterate_load_balancers(|lb| {
                let key = state
                    .add_entity(create_load_balancer_entity(&linker, &lb)?)?
                    .key
                    .clone();
                link_resource_group(state, &key)?;

                // Several backend configurations usually sit on one NIC.
                let mut seen = HashSet::new();
                let nic_ids = lb
                    .backend_ip_configuration_ids()
                    .filter_map(network_interface_id)
                    .filter(|id| seen.insert(id.to_lowercase()));
                for nic_id in nic_ids {
                    link_by_id(state, &LOAD_BALANCER_CONNECTS_NIC, &key, nic_id)?;
                }
                Ok(())
            })
            .await?;

        info!(count, "load balancers ingested");
        Ok(())
    })
}

/// Stored NIC with the payload it was built from.
#[derive(Debug, Deserialize)]
struct NetworkInterfaceRef {
    #[serde(rename = "_key")]
    key: String,
    #[serde(rename = "_rawData", default)]
    raw_data: Vec<RawData>,
}

impl NetworkInterfaceRef {
    fn payload(&self) -> Result<Option<NetworkInterface>> {
        self.raw_data
            .iter()
            .find(|raw| raw.name == "default")
            .map(|raw| {
                NetworkInterface::deserialize(&raw.raw_data)
                    .map_err(|e| CloudGraphError::parse(format!("{}: {e}", self.key)))
            })
            .transpose()
    }
}

fn build_nic_public_ip_relationships<'a>(
    ctx: &'a mut StepContext<'_>,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let state = &mut *ctx.job_state;
        let nics: Vec<NetworkInterfaceRef> =
            state.entities_of_type(NETWORK_INTERFACE_ENTITY_TYPE);

        let mut linked = 0usize;
        for nic in &nics {
            let Some(payload) = nic.payload()? else {
                warn!(key = %nic.key, "network interface without raw data, skipping");
                continue;
            };

            let mut seen = HashSet::new();
            let public_ip_ids = payload
                .properties
                .ip_configurations
                .iter()
                .filter_map(|c| c.properties.public_ip_address.as_ref())
                .filter_map(|address| address.id.as_deref())
                .filter(|id| seen.insert(id.to_lowercase()));
            for address_id in public_ip_ids {
                if link_by_id(state, &NIC_USES_PUBLIC_IP, &nic.key, address_id)?
                    == LinkOutcome::Linked
                {
                    linked += 1;
                }
            }
        }

        info!(linked, "network interface public IP relationships built");
        Ok(())
    })
}

pub fn steps() -> Vec<Step> {
    vec![
        Step {
            id: STEP_RM_NETWORK_INTERFACES,
            name: "Network Interfaces",
            entities: &[NETWORK_INTERFACE_ENTITY],
            relationships: &[RESOURCE_GROUP_HAS_NIC],
            depends_on: &[STEP_AD_ACCOUNT, STEP_RM_RESOURCES_RESOURCE_GROUPS],
            handler: fetch_network_interfaces,
        },
        Step {
            id: STEP_RM_NETWORK_PUBLIC_IP_ADDRESSES,
            name: "Public IP Addresses",
            entities: &[PUBLIC_IP_ADDRESS_ENTITY],
            relationships: &[RESOURCE_GROUP_HAS_PUBLIC_IP],
            depends_on: &[STEP_AD_ACCOUNT, STEP_RM_RESOURCES_RESOURCE_GROUPS],
            handler: fetch_public_ip_addresses,
        },
        Step {
            id: STEP_RM_NETWORK_VIRTUAL_NETWORKS,
            name: "Virtual Networks",
            entities: &[VIRTUAL_NETWORK_ENTITY, SUBNET_ENTITY],
            relationships: &[
                VIRTUAL_NETWORK_CONTAINS_SUBNET,
                RESOURCE_GROUP_HAS_VNET,
                RESOURCE_GROUP_HAS_SUBNET,
            ],
            depends_on: &[STEP_AD_ACCOUNT, STEP_RM_RESOURCES_RESOURCE_GROUPS],
            handler: fetch_virtual_networks,
        },
        Step {
            id: STEP_RM_NETWORK_SECURITY_GROUPS,
            name: "Network Security Groups",
            entities: &[SECURITY_GROUP_ENTITY],
            relationships: &[
                SECURITY_GROUP_PROTECTS_SUBNET,
                SECURITY_GROUP_PROTECTS_NIC,
                RESOURCE_GROUP_HAS_SECURITY_GROUP,
            ],
            depends_on: &[
                STEP_AD_ACCOUNT,
                STEP_RM_NETWORK_VIRTUAL_NETWORKS,
                STEP_RM_NETWORK_INTERFACES,
            ],
            handler: fetch_network_security_groups,
        },
        Step {
            id: STEP_RM_NETWORK_LOAD_BALANCERS,
            name: "Load Balancers",
            entities: &[LOAD_BALANCER_ENTITY],
            relationships: &[LOAD_BALANCER_CONNECTS_NIC, RESOURCE_GROUP_HAS_LB],
            depends_on: &[STEP_AD_ACCOUNT, STEP_RM_NETWORK_INTERFACES],
            handler: fetch_load_balancers,
        },
        Step {
            id: STEP_RM_NETWORK_NIC_PUBLIC_IP_RELATIONSHIPS,
            name: "Network Interface Public IP Relationships",
            entities: &[],
            relationships: &[NIC_USES_PUBLIC_IP],
            depends_on: &[STEP_RM_NETWORK_INTERFACES, STEP_RM_NETWORK_PUBLIC_IP_ADDRESSES],
            handler: build_nic_public_ip_relationships,
        },
    ]
}
