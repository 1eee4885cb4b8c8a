use cloudgraph_shared::{EntitySchema, RelationshipClass, RelationshipSchema};

pub const STEP_RM_RESOURCES_SUBSCRIPTIONS: &str = "rm-resources-subscriptions";
pub const STEP_RM_RESOURCES_RESOURCE_GROUPS: &str = "rm-resources-resource-groups";

pub const RESOURCE_GROUP_ENTITY_TYPE: &str = "azure_resource_group";

pub const SUBSCRIPTION_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Subscription",
    entity_type: "azure_subscription",
    class: &["Account"],
};

pub const RESOURCE_GROUP_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Resource Group",
    entity_type: RESOURCE_GROUP_ENTITY_TYPE,
    class: &["Group"],
};

pub const SUBSCRIPTION_HAS_RESOURCE_GROUP: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_subscription_has_resource_group",
    source_type: "azure_subscription",
    class: RelationshipClass::Has,
    target_type: RESOURCE_GROUP_ENTITY_TYPE,
};

/// `resource_group HAS <target_type>`, with the generated `_type`.
pub const fn resource_group_has(
    rel_type: &'static str,
    target_type: &'static str,
) -> RelationshipSchema {
    RelationshipSchema {
        rel_type,
        source_type: RESOURCE_GROUP_ENTITY_TYPE,
        class: RelationshipClass::Has,
        target_type,
    }
}
