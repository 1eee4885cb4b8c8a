use cloudgraph_shared::{EntitySchema, RelationshipClass, RelationshipSchema};

use crate::steps::active_directory::ACCOUNT_ENTITY_TYPE;

pub const STEP_RM_MANAGEMENT_GROUPS: &str = "rm-management-groups";

pub const MANAGEMENT_GROUP_ENTITY_TYPE: &str = "azure_management_group";

pub const MANAGEMENT_GROUP_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Management Group",
    entity_type: MANAGEMENT_GROUP_ENTITY_TYPE,
    class: &["Group"],
};

pub const ACCOUNT_HAS_ROOT_MANAGEMENT_GROUP: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_account_has_management_group",
    source_type: ACCOUNT_ENTITY_TYPE,
    class: RelationshipClass::Has,
    target_type: MANAGEMENT_GROUP_ENTITY_TYPE,
};

pub const MANAGEMENT_GROUP_CONTAINS_MANAGEMENT_GROUP: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_management_group_contains_group",
    source_type: MANAGEMENT_GROUP_ENTITY_TYPE,
    class: RelationshipClass::Contains,
    target_type: MANAGEMENT_GROUP_ENTITY_TYPE,
};
