use cloudgraph_shared::{EntitySchema, RelationshipClass, RelationshipSchema};

use crate::steps::resources::resource_group_has;

pub const STEP_RM_NETWORK_INTERFACES: &str = "rm-network-interfaces";
pub const STEP_RM_NETWORK_PUBLIC_IP_ADDRESSES: &str = "rm-network-public-ip-addresses";
pub const STEP_RM_NETWORK_VIRTUAL_NETWORKS: &str = "rm-network-virtual-networks";
pub const STEP_RM_NETWORK_SECURITY_GROUPS: &str = "rm-network-security-groups";
pub const STEP_RM_NETWORK_LOAD_BALANCERS: &str = "rm-network-load-balancers";
pub const STEP_RM_NETWORK_NIC_PUBLIC_IP_RELATIONSHIPS: &str =
    "rm-network-nic-public-ip-relationships";

pub const NETWORK_INTERFACE_ENTITY_TYPE: &str = "azure_nic";
pub const PUBLIC_IP_ADDRESS_ENTITY_TYPE: &str = "azure_public_ip";
pub const VIRTUAL_NETWORK_ENTITY_TYPE: &str = "azure_vnet";
pub const SUBNET_ENTITY_TYPE: &str = "azure_subnet";
pub const SECURITY_GROUP_ENTITY_TYPE: &str = "azure_security_group";
pub const LOAD_BALANCER_ENTITY_TYPE: &str = "azure_lb";

pub const NETWORK_INTERFACE_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Network Interface",
    entity_type: NETWORK_INTERFACE_ENTITY_TYPE,
    class: &["NetworkInterface"],
};

pub const PUBLIC_IP_ADDRESS_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Public IP Address",
    entity_type: PUBLIC_IP_ADDRESS_ENTITY_TYPE,
    class: &["IpAddress"],
};

pub const VIRTUAL_NETWORK_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Virtual Network",
    entity_type: VIRTUAL_NETWORK_ENTITY_TYPE,
    class: &["Network"],
};

pub const SUBNET_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Subnet",
    entity_type: SUBNET_ENTITY_TYPE,
    class: &["Network"],
};

pub const SECURITY_GROUP_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Security Group",
    entity_type: SECURITY_GROUP_ENTITY_TYPE,
    class: &["Firewall"],
};

pub const LOAD_BALANCER_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Load Balancer",
    entity_type: LOAD_BALANCER_ENTITY_TYPE,
    class: &["Gateway"],
};

pub const VIRTUAL_NETWORK_CONTAINS_SUBNET: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_vnet_contains_subnet",
    source_type: VIRTUAL_NETWORK_ENTITY_TYPE,
    class: RelationshipClass::Contains,
    target_type: SUBNET_ENTITY_TYPE,
};

pub const SECURITY_GROUP_PROTECTS_SUBNET: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_security_group_protects_subnet",
    source_type: SECURITY_GROUP_ENTITY_TYPE,
    class: RelationshipClass::Protects,
    target_type: SUBNET_ENTITY_TYPE,
};

pub const SECURITY_GROUP_PROTECTS_NIC: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_security_group_protects_nic",
    source_type: SECURITY_GROUP_ENTITY_TYPE,
    class: RelationshipClass::Protects,
    target_type: NETWORK_INTERFACE_ENTITY_TYPE,
};

pub const LOAD_BALANCER_CONNECTS_NIC: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_lb_connects_nic",
    source_type: LOAD_BALANCER_ENTITY_TYPE,
    class: RelationshipClass::Connects,
    target_type: NETWORK_INTERFACE_ENTITY_TYPE,
};

pub const NIC_USES_PUBLIC_IP: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_nic_uses_public_ip",
    source_type: NETWORK_INTERFACE_ENTITY_TYPE,
    class: RelationshipClass::Uses,
    target_type: PUBLIC_IP_ADDRESS_ENTITY_TYPE,
};

pub const RESOURCE_GROUP_HAS_NIC: RelationshipSchema =
    resource_group_has("azure_resource_group_has_nic", NETWORK_INTERFACE_ENTITY_TYPE);
pub const RESOURCE_GROUP_HAS_PUBLIC_IP: RelationshipSchema =
    resource_group_has("azure_resource_group_has_public_ip", PUBLIC_IP_ADDRESS_ENTITY_TYPE);
pub const RESOURCE_GROUP_HAS_VNET: RelationshipSchema =
    resource_group_has("azure_resource_group_has_vnet", VIRTUAL_NETWORK_ENTITY_TYPE);
pub const RESOURCE_GROUP_HAS_SUBNET: RelationshipSchema =
    resource_group_has("azure_resource_group_has_subnet", SUBNET_ENTITY_TYPE);
pub const RESOURCE_GROUP_HAS_SECURITY_GROUP: RelationshipSchema = resource_group_has(
    "azure_resource_group_has_security_group",
    SECURITY_GROUP_ENTITY_TYPE,
);
pub const RESOURCE_GROUP_HAS_LB: RelationshipSchema =
    resource_group_has("azure_resource_group_has_lb", LOAD_BALANCER_ENTITY_TYPE);
