use cloudgraph_shared::{EntitySchema, RelationshipClass, RelationshipSchema};

use crate::steps::storage::STORAGE_ACCOUNT_ENTITY_TYPE;

pub const DIAGNOSTIC_LOG_SETTING_ENTITY_TYPE: &str = "azure_diagnostic_log_setting";
pub const DIAGNOSTIC_METRIC_SETTING_ENTITY_TYPE: &str = "azure_diagnostic_metric_setting";

pub const DIAGNOSTIC_LOG_SETTING_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Diagnostic Log Setting",
    entity_type: DIAGNOSTIC_LOG_SETTING_ENTITY_TYPE,
    class: &["Configuration"],
};

pub const DIAGNOSTIC_METRIC_SETTING_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Diagnostic Metric Setting",
    entity_type: DIAGNOSTIC_METRIC_SETTING_ENTITY_TYPE,
    class: &["Configuration"],
};

pub const DIAGNOSTIC_LOG_SETTING_USES_STORAGE_ACCOUNT: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_diagnostic_log_setting_uses_storage_account",
    source_type: DIAGNOSTIC_LOG_SETTING_ENTITY_TYPE,
    class: RelationshipClass::Uses,
    target_type: STORAGE_ACCOUNT_ENTITY_TYPE,
};

pub const DIAGNOSTIC_METRIC_SETTING_USES_STORAGE_ACCOUNT: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_diagnostic_metric_setting_uses_storage_account",
    source_type: DIAGNOSTIC_METRIC_SETTING_ENTITY_TYPE,
    class: RelationshipClass::Uses,
    target_type: STORAGE_ACCOUNT_ENTITY_TYPE,
};

/// `<source_type> HAS diagnostic log setting`.
pub const fn has_diagnostic_log_setting(
    rel_type: &'static str,
    source_type: &'static str,
) -> RelationshipSchema {
    RelationshipSchema {
        rel_type,
        source_type,
        class: RelationshipClass::Has,
        target_type: DIAGNOSTIC_LOG_SETTING_ENTITY_TYPE,
    }
}

/// `<source_type> HAS diagnostic metric setting`.
pub const fn has_diagnostic_metric_setting(
    rel_type: &'static str,
    source_type: &'static str,
) -> RelationshipSchema {
    RelationshipSchema {
        rel_type,
        source_type,
        class: RelationshipClass::Has,
        target_type: DIAGNOSTIC_METRIC_SETTING_ENTITY_TYPE,
    }
}
