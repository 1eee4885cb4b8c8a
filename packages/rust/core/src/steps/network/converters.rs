use cloudgraph_client::network::{
    IpConfiguration, LoadBalancer, NetworkInterface, NetworkSecurityGroup, PublicIpAddress,
    Subnet, VirtualNetwork,
};
use cloudgraph_shared::{Entity, Relationship, Result};

use super::constants::*;
use crate::resource_id::resource_group_name;
use crate::steps::{ArmResource, resource_key};
use crate::web_linker::WebLinker;

/// Public addresses of the configurations that carry one, in order.
fn public_ip_addresses(configurations: &[IpConfiguration]) -> Vec<&str> {
    configurations
        .iter()
        .filter_map(|c| c.properties.public_ip_address.as_ref())
        .filter_map(PublicIpAddress::ip_address)
        .collect()
}

fn private_ip_addresses(configurations: &[IpConfiguration]) -> Vec<&str> {
    configurations
        .iter()
        .filter_map(|c| c.properties.private_ip_address.as_deref())
        .collect()
}

/// `"{name} ({cidr})"`, or just the name without a CIDR.
fn network_display_name(name: Option<&str>, cidr: Option<&str>) -> Option<String> {
    match (name, cidr) {
        (Some(name), Some(cidr)) => Some(format!("{name} ({cidr})")),
        (name, _) => name.map(str::to_string),
    }
}

pub fn create_load_balancer_entity(linker: &WebLinker, lb: &LoadBalancer) -> Result<Entity> {
    let frontends = &lb.properties.frontend_ip_configurations;
    let public_ip = public_ip_addresses(frontends);
    let private_ip = private_ip_addresses(frontends);

    let entity = ArmResource {
        id: lb.id.as_deref(),
        name: lb.name.as_deref(),
        resource_type: lb.resource_type.as_deref(),
        location: lb.location.as_deref(),
        tags: lb.tags.as_ref(),
    }
    .entity(&LOAD_BALANCER_ENTITY, linker, &[])?;

    Ok(entity
        .with("category", ["network"])
        .with("function", ["load-balancing"])
        .with("resourceGuid", &lb.properties.resource_guid)
        .with("public", !public_ip.is_empty())
        .with("publicIp", public_ip)
        .with("privateIp", private_ip)
        .with_raw_data("default", lb))
}

pub fn create_network_interface_entity(
    linker: &WebLinker,
    nic: &NetworkInterface,
) -> Result<Entity> {
    let properties = &nic.properties;
    let private_ip = private_ip_addresses(&properties.ip_configurations);

    let entity = ArmResource {
        id: nic.id.as_deref(),
        name: nic.name.as_deref(),
        resource_type: nic.resource_type.as_deref(),
        location: nic.location.as_deref(),
        tags: nic.tags.as_ref(),
    }
    .entity(&NETWORK_INTERFACE_ENTITY, linker, &[])?;

    Ok(entity
        .with("resourceGuid", &properties.resource_guid)
        .with("privateIp", &private_ip)
        .with("privateIpAddress", &private_ip)
        .with("macAddress", &properties.mac_address)
        .with(
            "securityGroupId",
            properties.network_security_group.as_ref().and_then(|g| g.id.as_deref()),
        )
        .with(
            "virtualMachineId",
            properties.virtual_machine.as_ref().and_then(|vm| vm.id.as_deref()),
        )
        .with("ipForwarding", properties.enable_ip_forwarding)
        .with_raw_data("default", nic))
}

pub fn create_public_ip_address_entity(
    linker: &WebLinker,
    address: &PublicIpAddress,
) -> Result<Entity> {
    let entity = ArmResource {
        id: address.id.as_deref(),
        name: address.name.as_deref(),
        resource_type: address.resource_type.as_deref(),
        location: address.location.as_deref(),
        tags: address.tags.as_ref(),
    }
    .entity(&PUBLIC_IP_ADDRESS_ENTITY, linker, &[])?;

    Ok(entity
        .with("resourceGuid", &address.properties.resource_guid)
        .with("publicIp", address.ip_address())
        .with("publicIpAddress", address.ip_address())
        .with("public", true)
        .with("sku", address.sku.as_ref().and_then(|s| s.name.as_deref()))
        .with_raw_data("default", address))
}

pub fn create_virtual_network_entity(linker: &WebLinker, vnet: &VirtualNetwork) -> Result<Entity> {
    let cidr = vnet.cidr();
    let entity = ArmResource {
        id: vnet.id.as_deref(),
        name: vnet.name.as_deref(),
        resource_type: vnet.resource_type.as_deref(),
        location: vnet.location.as_deref(),
        tags: vnet.tags.as_ref(),
    }
    .entity(&VIRTUAL_NETWORK_ENTITY, linker, &["environment"])?;

    Ok(entity
        .with("displayName", network_display_name(vnet.name.as_deref(), cidr))
        .with("CIDR", cidr)
        .with("public", false)
        .with("internal", true)
        .with_raw_data("default", vnet))
}

/// Subnets carry no tags or location of their own; both come from the vnet.
pub fn create_subnet_entity(
    linker: &WebLinker,
    vnet: &VirtualNetwork,
    subnet: &Subnet,
) -> Result<Entity> {
    let key = resource_key(subnet.id.as_deref(), &SUBNET_ENTITY)?;
    let cidr = subnet.properties.address_prefix.as_deref();
    let environment = vnet.tags.as_ref().and_then(|tags| tags.get("environment"));

    Ok(Entity::new(key, &SUBNET_ENTITY)
        .with("id", &subnet.id)
        .with("name", &subnet.name)
        .with("displayName", network_display_name(subnet.name.as_deref(), cidr))
        .with("CIDR", cidr)
        .with("public", false)
        .with("internal", true)
        .with("region", &vnet.location)
        .with("resourceGroup", subnet.id.as_deref().and_then(resource_group_name))
        .with("environment", environment)
        .with("webLink", linker.portal_resource_url(subnet.id.as_deref()))
        .with_raw_data("default", subnet))
}

pub fn create_network_security_group_entity(
    linker: &WebLinker,
    nsg: &NetworkSecurityGroup,
) -> Result<Entity> {
    let mut category = Vec::new();
    if !nsg.properties.subnets.is_empty() {
        category.push("network");
    }
    if !nsg.properties.network_interfaces.is_empty() {
        category.push("host");
    }

    let entity = ArmResource {
        id: nsg.id.as_deref(),
        name: nsg.name.as_deref(),
        resource_type: nsg.resource_type.as_deref(),
        location: nsg.location.as_deref(),
        tags: nsg.tags.as_ref(),
    }
    .entity(&SECURITY_GROUP_ENTITY, linker, &["environment"])?;

    Ok(entity
        .with("category", category)
        .with("resourceGuid", &nsg.properties.resource_guid)
        .with_raw_data("default", nsg))
}

pub fn create_virtual_network_subnet_relationship(vnet: &Entity, subnet: &Entity) -> Relationship {
    VIRTUAL_NETWORK_CONTAINS_SUBNET.create(&vnet.key, &subnet.key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudgraph_client::SubResource;
    use cloudgraph_client::network::{
        AddressSpace, IpConfigurationProperties, LoadBalancerProperties,
        NetworkSecurityGroupProperties, PublicIpAddressProperties, SubnetProperties,
        VirtualNetworkProperties,
    };

    const RG: &str = "/subscriptions/s1/resourceGroups/j1dev/providers/Microsoft.Network";

    fn linker() -> WebLinker {
        WebLinker::new(Some("contoso.com"))
    }

    fn sub_resource(id: &str) -> SubResource {
        SubResource {
            id: Some(id.into()),
        }
    }

    fn frontend(private: Option<&str>, public: Option<Option<&str>>) -> IpConfiguration {
        IpConfiguration {
            properties: IpConfigurationProperties {
                private_ip_address: private.map(str::to_string),
                public_ip_address: public.map(|address| PublicIpAddress {
                    properties: PublicIpAddressProperties {
                        ip_address: address.map(str::to_string),
                        ..Default::default()
                    },
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn load_balancer(frontends: Vec<IpConfiguration>) -> LoadBalancer {
        LoadBalancer {
            id: Some(format!("{RG}/loadBalancers/lb1")),
            name: Some("lb1".into()),
            location: Some("eastus".into()),
            properties: LoadBalancerProperties {
                frontend_ip_configurations: frontends,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn load_balancer_with_one_public_frontend() {
        let lb = load_balancer(vec![
            frontend(Some("10.0.0.4"), None),
            frontend(None, Some(Some("1.2.3.4"))),
        ]);
        let entity = create_load_balancer_entity(&linker(), &lb).unwrap();

        assert_eq!(entity.class, vec!["Gateway"]);
        assert_eq!(entity.property("publicIp"), Some(&serde_json::json!(["1.2.3.4"])));
        assert_eq!(entity.property("privateIp"), Some(&serde_json::json!(["10.0.0.4"])));
        assert_eq!(entity.property("public"), Some(&serde_json::json!(true)));
        assert_eq!(entity.property("category"), Some(&serde_json::json!(["network"])));
        assert_eq!(entity.property("function"), Some(&serde_json::json!(["load-balancing"])));
        assert_eq!(entity.str_property("resourceGroup"), Some("j1dev"));
    }

    #[test]
    fn load_balancer_public_sub_object_without_address() {
        let lb = load_balancer(vec![frontend(Some("10.0.0.4"), Some(None))]);
        let entity = create_load_balancer_entity(&linker(), &lb).unwrap();

        assert_eq!(entity.property("publicIp"), Some(&serde_json::json!([])));
        assert_eq!(entity.property("public"), Some(&serde_json::json!(false)));
    }

    #[test]
    fn network_interface_fields() {
        let nic = NetworkInterface {
            id: Some(format!("{RG}/networkInterfaces/nic1")),
            name: Some("nic1".into()),
            properties: cloudgraph_client::network::NetworkInterfaceProperties {
                ip_configurations: vec![frontend(Some("10.0.0.5"), None)],
                mac_address: Some("00-0D-3A-1B-C7-21".into()),
                enable_ip_forwarding: Some(false),
                network_security_group: Some(sub_resource(&format!(
                    "{RG}/networkSecurityGroups/nsg1"
                ))),
                ..Default::default()
            },
            ..Default::default()
        };

        let entity = create_network_interface_entity(&linker(), &nic).unwrap();
        assert_eq!(entity.property("privateIp"), Some(&serde_json::json!(["10.0.0.5"])));
        assert_eq!(entity.property("privateIpAddress"), Some(&serde_json::json!(["10.0.0.5"])));
        assert_eq!(entity.str_property("macAddress"), Some("00-0D-3A-1B-C7-21"));
        assert_eq!(entity.property("ipForwarding"), Some(&serde_json::json!(false)));
        assert!(entity.str_property("securityGroupId").unwrap().ends_with("/nsg1"));
        assert!(entity.property("virtualMachineId").is_none());
        assert!(entity.property("publicIp").is_none());
        assert_eq!(entity.raw_data[0].name, "default");
    }

    #[test]
    fn public_ip_address_fields() {
        let address = PublicIpAddress {
            id: Some(format!("{RG}/publicIPAddresses/ip1")),
            name: Some("ip1".into()),
            sku: Some(cloudgraph_client::network::Sku {
                name: Some("Basic".into()),
                tier: None,
            }),
            properties: PublicIpAddressProperties {
                ip_address: Some("52.1.2.3".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let entity = create_public_ip_address_entity(&linker(), &address).unwrap();
        assert_eq!(entity.class, vec!["IpAddress"]);
        assert_eq!(entity.str_property("publicIp"), Some("52.1.2.3"));
        assert_eq!(entity.str_property("publicIpAddress"), Some("52.1.2.3"));
        assert_eq!(entity.property("public"), Some(&serde_json::json!(true)));
        assert_eq!(entity.str_property("sku"), Some("Basic"));
    }

    fn vnet(prefixes: &[&str], environment: Option<&str>) -> VirtualNetwork {
        VirtualNetwork {
            id: Some(format!("{RG}/virtualNetworks/vnet1")),
            name: Some("vnet1".into()),
            location: Some("eastus".into()),
            tags: environment.map(|env| [("environment".to_string(), env.to_string())].into()),
            properties: VirtualNetworkProperties {
                address_space: Some(AddressSpace {
                    address_prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn virtual_network_cidr_and_display_name() {
        let entity =
            create_virtual_network_entity(&linker(), &vnet(&["10.0.0.0/16", "10.1.0.0/16"], Some("prod")))
                .unwrap();
        assert_eq!(entity.str_property("CIDR"), Some("10.0.0.0/16"));
        assert_eq!(entity.display_name(), Some("vnet1 (10.0.0.0/16)"));
        assert_eq!(entity.str_property("environment"), Some("prod"));
        assert_eq!(entity.property("internal"), Some(&serde_json::json!(true)));

        let bare = create_virtual_network_entity(&linker(), &vnet(&[], None)).unwrap();
        assert_eq!(bare.display_name(), Some("vnet1"));
        assert!(bare.property("CIDR").is_none());
        assert!(bare.property("environment").is_none());
    }

    #[test]
    fn subnet_takes_region_and_environment_from_vnet() {
        let parent = vnet(&["10.0.0.0/16"], Some("prod"));
        let subnet = Subnet {
            id: Some(format!("{RG}/virtualNetworks/vnet1/subnets/default")),
            name: Some("default".into()),
            properties: SubnetProperties {
                address_prefix: Some("10.0.1.0/24".into()),
                ..Default::default()
            },
        };

        let entity = create_subnet_entity(&linker(), &parent, &subnet).unwrap();
        assert_eq!(entity.display_name(), Some("default (10.0.1.0/24)"));
        assert_eq!(entity.str_property("region"), Some("eastus"));
        assert_eq!(entity.str_property("environment"), Some("prod"));
        assert_eq!(entity.str_property("resourceGroup"), Some("j1dev"));

        let vnet_entity = create_virtual_network_entity(&linker(), &parent).unwrap();
        let rel = create_virtual_network_subnet_relationship(&vnet_entity, &entity);
        assert_eq!(rel.rel_type, "azure_vnet_contains_subnet");
    }

    fn nsg(subnets: usize, interfaces: usize) -> NetworkSecurityGroup {
        NetworkSecurityGroup {
            id: Some(format!("{RG}/networkSecurityGroups/nsg1")),
            name: Some("nsg1".into()),
            properties: NetworkSecurityGroupProperties {
                subnets: (0..subnets)
                    .map(|i| sub_resource(&format!("{RG}/virtualNetworks/v/subnets/s{i}")))
                    .collect(),
                network_interfaces: (0..interfaces)
                    .map(|i| sub_resource(&format!("{RG}/networkInterfaces/nic{i}")))
                    .collect(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn security_group_category_follows_attachments() {
        let category = |group: NetworkSecurityGroup| {
            create_network_security_group_entity(&linker(), &group)
                .unwrap()
                .property("category")
                .cloned()
        };

        assert_eq!(category(nsg(1, 0)), Some(serde_json::json!(["network"])));
        assert_eq!(category(nsg(1, 2)), Some(serde_json::json!(["network", "host"])));
        assert_eq!(category(nsg(0, 1)), Some(serde_json::json!(["host"])));
        assert_eq!(category(nsg(0, 0)), Some(serde_json::json!([])));
    }
}
