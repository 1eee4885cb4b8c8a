use cloudgraph_shared::{EntitySchema, RelationshipSchema};

use crate::steps::resources::resource_group_has;

pub const STEP_RM_STORAGE_ACCOUNTS: &str = "rm-storage-accounts";

pub const STORAGE_ACCOUNT_ENTITY_TYPE: &str = "azure_storage_account";

pub const STORAGE_ACCOUNT_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Storage Account",
    entity_type: STORAGE_ACCOUNT_ENTITY_TYPE,
    class: &["Service"],
};

pub const RESOURCE_GROUP_HAS_STORAGE_ACCOUNT: RelationshipSchema = resource_group_has(
    "azure_resource_group_has_storage_account",
    STORAGE_ACCOUNT_ENTITY_TYPE,
);
