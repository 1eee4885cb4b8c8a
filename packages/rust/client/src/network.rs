//! Resource Manager: network interfaces, public IPs, virtual networks,
//! security groups and load balancers.
//!
//! All of these are listed subscription-wide. ARM nests most fields under a
//! `properties` object, and the models keep that shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use cloudgraph_shared::Result;

use crate::{Api, AzureClient, SubResource, Tags};

const NETWORK_API_VERSION: &str = "2020-05-01";

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sku {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicIpAddressProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(rename = "publicIPAllocationMethod", skip_serializing_if = "Option::is_none")]
    pub public_ip_allocation_method: Option<String>,
    #[serde(rename = "publicIPAddressVersion", skip_serializing_if = "Option::is_none")]
    pub public_ip_address_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicIpAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    pub properties: PublicIpAddressProperties,
}

impl PublicIpAddress {
    pub fn ip_address(&self) -> Option<&str> {
        self.properties.ip_address.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IpConfigurationProperties {
    #[serde(rename = "privateIPAddress", skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,
    #[serde(rename = "privateIPAllocationMethod", skip_serializing_if = "Option::is_none")]
    pub private_ip_allocation_method: Option<String>,
    #[serde(rename = "publicIPAddress", skip_serializing_if = "Option::is_none")]
    pub public_ip_address: Option<PublicIpAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

/// Shared by NIC IP configurations and load balancer frontend configurations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: IpConfigurationProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    #[serde(rename = "ipConfigurations")]
    pub ip_configurations: Vec<IpConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(rename = "enableIPForwarding", skip_serializing_if = "Option::is_none")]
    pub enable_ip_forwarding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_security_group: Option<SubResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_machine: Option<SubResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    pub properties: NetworkInterfaceProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubnetProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_security_group: Option<SubResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subnet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: SubnetProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressSpace {
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_space: Option<AddressSpace>,
    pub subnets: Vec<Subnet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualNetwork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    pub properties: VirtualNetworkProperties,
}

impl VirtualNetwork {
    /// First address prefix of the address space.
    pub fn cidr(&self) -> Option<&str> {
        self.properties
            .address_space
            .as_ref()
            .and_then(|space| space.address_prefixes.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkSecurityGroupProperties {
    pub security_rules: Vec<Value>,
    pub default_security_rules: Vec<Value>,
    pub subnets: Vec<SubResource>,
    pub network_interfaces: Vec<SubResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSecurityGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    pub properties: NetworkSecurityGroupProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendAddressPoolProperties {
    #[serde(rename = "backendIPConfigurations")]
    pub backend_ip_configurations: Vec<SubResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendAddressPool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: BackendAddressPoolProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancerProperties {
    #[serde(rename = "frontendIPConfigurations")]
    pub frontend_ip_configurations: Vec<IpConfiguration>,
    pub backend_address_pools: Vec<BackendAddressPool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    pub properties: LoadBalancerProperties,
}

impl LoadBalancer {
    /// IDs of every backend IP configuration across all pools.
    pub fn backend_ip_configuration_ids(&self) -> impl Iterator<Item = &str> {
        self.properties
            .backend_address_pools
            .iter()
            .flat_map(|pool| pool.properties.backend_ip_configurations.iter())
            .filter_map(|config| config.id.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl AzureClient {
    fn network_list_url(&self, resource: &str) -> Result<String> {
        Ok(self.management_url(&format!(
            "/subscriptions/{}/providers/Microsoft.Network/{resource}?api-version={NETWORK_API_VERSION}",
            self.subscription_id()?
        )))
    }

    #[instrument(skip_all)]
    pub async fn iterate_network_interfaces<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(NetworkInterface) -> Result<()>,
    {
        let url = self.network_list_url("networkInterfaces")?;
        self.iterate_pages(Api::Management, url, each).await
    }

    #[instrument(skip_all)]
    pub async fn iterate_public_ip_addresses<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(PublicIpAddress) -> Result<()>,
    {
        let url = self.network_list_url("publicIPAddresses")?;
        self.iterate_pages(Api::Management, url, each).await
    }

    #[instrument(skip_all)]
    pub async fn iterate_virtual_networks<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(VirtualNetwork) -> Result<()>,
    {
        let url = self.network_list_url("virtualNetworks")?;
        self.iterate_pages(Api::Management, url, each).await
    }

    #[instrument(skip_all)]
    pub async fn iterate_network_security_groups<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(NetworkSecurityGroup) -> Result<()>,
    {
        let url = self.network_list_url("networkSecurityGroups")?;
        self.iterate_pages(Api::Management, url, each).await
    }

    #[instrument(skip_all)]
    pub async fn iterate_load_balancers<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(LoadBalancer) -> Result<()>,
    {
        let url = self.network_list_url("loadBalancers")?;
        self.iterate_pages(Api::Management, url, each).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{SUBSCRIPTION, client_for};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parses_load_balancer_frontend_and_backend_configurations() {
        let lb: LoadBalancer = serde_json::from_value(serde_json::json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/loadBalancers/lb1",
            "name": "lb1",
            "properties": {
                "frontendIPConfigurations": [
                    { "name": "fe1", "properties": { "privateIPAddress": "10.0.0.4" } },
                    { "name": "fe2", "properties": { "publicIPAddress": {
                        "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/publicIPAddresses/pip",
                        "properties": { "ipAddress": "1.2.3.4" }
                    } } }
                ],
                "backendAddressPools": [{
                    "name": "pool",
                    "properties": { "backendIPConfigurations": [
                        { "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/networkInterfaces/nic1/ipConfigurations/ipconfig1" }
                    ] }
                }]
            }
        }))
        .unwrap();

        let frontends = &lb.properties.frontend_ip_configurations;
        assert_eq!(frontends.len(), 2);
        assert_eq!(frontends[0].properties.private_ip_address.as_deref(), Some("10.0.0.4"));
        assert_eq!(
            frontends[1]
                .properties
                .public_ip_address
                .as_ref()
                .and_then(PublicIpAddress::ip_address),
            Some("1.2.3.4")
        );
        assert_eq!(lb.backend_ip_configuration_ids().count(), 1);
    }

    #[test]
    fn vnet_cidr_is_first_prefix() {
        let vnet: VirtualNetwork = serde_json::from_value(serde_json::json!({
            "name": "vnet",
            "properties": { "addressSpace": { "addressPrefixes": ["10.0.0.0/16", "10.1.0.0/16"] } }
        }))
        .unwrap();
        assert_eq!(vnet.cidr(), Some("10.0.0.0/16"));
        assert_eq!(VirtualNetwork::default().cidr(), None);
    }

    #[tokio::test]
    async fn lists_network_interfaces_subscription_wide() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path(format!(
                "/subscriptions/{SUBSCRIPTION}/providers/Microsoft.Network/networkInterfaces"
            )))
            .and(query_param("api-version", NETWORK_API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{
                    "id": "nic-id",
                    "name": "nic1",
                    "properties": {
                        "macAddress": "00-0D-3A-1B-C7-21",
                        "ipConfigurations": [{ "properties": { "privateIPAddress": "10.0.2.4" } }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let mut nics = Vec::new();
        client
            .iterate_network_interfaces(|nic| {
                nics.push(nic);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(nics.len(), 1);
        assert_eq!(nics[0].properties.mac_address.as_deref(), Some("00-0D-3A-1B-C7-21"));
    }
}
