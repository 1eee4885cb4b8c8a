use cloudgraph_shared::{EntitySchema, RelationshipClass, RelationshipSchema};

pub const STEP_AD_ACCOUNT: &str = "ad-account";
pub const STEP_AD_USERS: &str = "ad-users";
pub const STEP_AD_GROUPS: &str = "ad-groups";
pub const STEP_AD_SERVICE_PRINCIPALS: &str = "ad-service-principals";

pub const ACCOUNT_ENTITY_TYPE: &str = "azure_account";

pub const ACCOUNT_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[AD] Account",
    entity_type: ACCOUNT_ENTITY_TYPE,
    class: &["Account"],
};

pub const USER_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[AD] User",
    entity_type: "azure_user",
    class: &["User"],
};

pub const GROUP_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[AD] Group",
    entity_type: "azure_user_group",
    class: &["UserGroup"],
};

pub const SERVICE_PRINCIPAL_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[AD] Service Principal",
    entity_type: "azure_service_principal",
    class: &["Service"],
};

pub const ACCOUNT_HAS_USER: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_account_has_user",
    source_type: ACCOUNT_ENTITY_TYPE,
    class: RelationshipClass::Has,
    target_type: "azure_user",
};

/// Shorter than the generated `azure_account_has_user_group`.
pub const ACCOUNT_HAS_GROUP: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_account_has_group",
    source_type: ACCOUNT_ENTITY_TYPE,
    class: RelationshipClass::Has,
    target_type: "azure_user_group",
};

pub const ACCOUNT_HAS_SERVICE_PRINCIPAL: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_account_has_service_principal",
    source_type: ACCOUNT_ENTITY_TYPE,
    class: RelationshipClass::Has,
    target_type: "azure_service_principal",
};
