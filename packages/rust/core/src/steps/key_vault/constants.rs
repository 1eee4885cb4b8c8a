use cloudgraph_shared::{EntitySchema, RelationshipClass, RelationshipSchema};

use crate::steps::active_directory::ACCOUNT_ENTITY_TYPE;
use crate::steps::monitor::{
    DiagnosticLinks, has_diagnostic_log_setting, has_diagnostic_metric_setting,
};
use crate::steps::resources::resource_group_has;

pub const STEP_RM_KEYVAULT_VAULTS: &str = "rm-keyvault-vaults";

pub const KEY_VAULT_SERVICE_ENTITY_TYPE: &str = "azure_keyvault_service";

pub const KEY_VAULT_SERVICE_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Key Vault",
    entity_type: KEY_VAULT_SERVICE_ENTITY_TYPE,
    class: &["Service"],
};

pub const ACCOUNT_HAS_KEY_VAULT: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_account_has_keyvault_service",
    source_type: ACCOUNT_ENTITY_TYPE,
    class: RelationshipClass::Has,
    target_type: KEY_VAULT_SERVICE_ENTITY_TYPE,
};

pub const RESOURCE_GROUP_HAS_KEY_VAULT: RelationshipSchema = resource_group_has(
    "azure_resource_group_has_keyvault_service",
    KEY_VAULT_SERVICE_ENTITY_TYPE,
);

pub const KEY_VAULT_HAS_DIAGNOSTIC_LOG_SETTING: RelationshipSchema = has_diagnostic_log_setting(
    "azure_keyvault_service_has_diagnostic_log_setting",
    KEY_VAULT_SERVICE_ENTITY_TYPE,
);

pub const KEY_VAULT_HAS_DIAGNOSTIC_METRIC_SETTING: RelationshipSchema =
    has_diagnostic_metric_setting(
        "azure_keyvault_service_has_diagnostic_metric_setting",
        KEY_VAULT_SERVICE_ENTITY_TYPE,
    );

pub const KEY_VAULT_DIAGNOSTIC_LINKS: DiagnosticLinks = DiagnosticLinks {
    has_log_setting: KEY_VAULT_HAS_DIAGNOSTIC_LOG_SETTING,
    has_metric_setting: KEY_VAULT_HAS_DIAGNOSTIC_METRIC_SETTING,
};
