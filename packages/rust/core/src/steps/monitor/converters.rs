use cloudgraph_client::monitor::{CategorySetting, DiagnosticSettingsResource};
use cloudgraph_shared::{Entity, EntitySchema, Result};

use super::constants::*;
use crate::steps::resource_key;
use crate::web_linker::WebLinker;

/// Which list of a diagnostic setting a category entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Log,
    Metric,
}

impl SettingKind {
    pub fn schema(self) -> &'static EntitySchema {
        match self {
            Self::Log => &DIAGNOSTIC_LOG_SETTING_ENTITY,
            Self::Metric => &DIAGNOSTIC_METRIC_SETTING_ENTITY,
        }
    }

    fn segment(self) -> &'static str {
        match self {
            Self::Log => "logs",
            Self::Metric => "metrics",
        }
    }
}

/// One entity per category entry, keyed
/// `{settingId}/{logs|metrics}/{category}/{enabled}/{days}/{retentionEnabled}`.
///
/// A missing retention policy renders as `0/false`.
pub fn create_diagnostic_setting_entity(
    linker: &WebLinker,
    setting: &DiagnosticSettingsResource,
    kind: SettingKind,
    entry: &CategorySetting,
) -> Result<Entity> {
    let schema = kind.schema();
    let setting_id = resource_key(setting.id.as_deref(), schema)?;
    let retention = entry.retention_policy.clone().unwrap_or_default();
    let key = format!(
        "{setting_id}/{}/{}/{}/{}/{}",
        kind.segment(),
        entry.category.as_deref().unwrap_or_default(),
        entry.enabled,
        retention.days,
        retention.enabled,
    );

    let properties = &setting.properties;
    Ok(Entity::new(key.clone(), schema)
        .with("id", &key)
        .with("name", &setting.name)
        .with("displayName", &setting.name)
        .with("category", &entry.category)
        .with("enabled", entry.enabled)
        .with("timeGrain", &entry.time_grain)
        .with("retentionPolicy.days", entry.retention_policy.as_ref().map(|r| r.days))
        .with("retentionPolicy.enabled", entry.retention_policy.as_ref().map(|r| r.enabled))
        .with("storageAccountId", &properties.storage_account_id)
        .with("eventHubAuthorizationRuleId", &properties.event_hub_authorization_rule_id)
        .with("eventHubName", &properties.event_hub_name)
        .with("logAnalyticsDestinationType", &properties.log_analytics_destination_type)
        .with("serviceBusRuleId", &properties.service_bus_rule_id)
        .with("workspaceId", &properties.workspace_id)
        .with("webLink", linker.portal_resource_url(Some(&setting_id))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudgraph_client::monitor::{DiagnosticSettingsProperties, RetentionPolicy};

    const SETTING_ID: &str = "/subscriptions/s1/resourcegroups/j1dev/providers/microsoft.keyvault/vaults/v1/providers/microsoft.insights/diagnosticSettings/diag";

    fn setting(entry: CategorySetting) -> DiagnosticSettingsResource {
        DiagnosticSettingsResource {
            id: Some(SETTING_ID.into()),
            name: Some("diag".into()),
            properties: DiagnosticSettingsProperties {
                storage_account_id: Some("/subscriptions/s1/resourceGroups/j1dev/providers/Microsoft.Storage/storageAccounts/st1".into()),
                logs: vec![entry],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn log_entry_key_encodes_category_and_retention() {
        let entry = CategorySetting {
            category: Some("AuditEvent".into()),
            enabled: true,
            retention_policy: Some(RetentionPolicy { enabled: true, days: 7 }),
            ..Default::default()
        };

        let entity = create_diagnostic_setting_entity(
            &WebLinker::new(Some("contoso.com")),
            &setting(entry.clone()),
            SettingKind::Log,
            &entry,
        )
        .unwrap();

        assert_eq!(entity.key, format!("{SETTING_ID}/logs/AuditEvent/true/7/true"));
        assert_eq!(entity.str_property("id"), Some(entity.key.as_str()));
        assert_eq!(entity.entity_type, DIAGNOSTIC_LOG_SETTING_ENTITY_TYPE);
        assert_eq!(entity.property("retentionPolicy.days"), Some(&serde_json::json!(7)));
        assert_eq!(
            entity.str_property("webLink"),
            Some(format!("https://portal.azure.com/#@contoso.com/resource{SETTING_ID}").as_str())
        );
        assert!(entity.property("workspaceId").is_none());
    }

    #[test]
    fn missing_retention_policy_uses_defaults_in_key() {
        let entry = CategorySetting {
            category: Some("AllMetrics".into()),
            enabled: false,
            ..Default::default()
        };

        let entity = create_diagnostic_setting_entity(
            &WebLinker::new(None),
            &setting(entry.clone()),
            SettingKind::Metric,
            &entry,
        )
        .unwrap();

        assert_eq!(entity.key, format!("{SETTING_ID}/metrics/AllMetrics/false/0/false"));
        assert_eq!(entity.entity_type, DIAGNOSTIC_METRIC_SETTING_ENTITY_TYPE);
        assert!(entity.property("retentionPolicy.days").is_none());
    }

    #[test]
    fn setting_without_id_is_rejected() {
        let entry = CategorySetting::default();
        let mut resource = setting(entry.clone());
        resource.id = None;

        assert!(
            create_diagnostic_setting_entity(&WebLinker::new(None), &resource, SettingKind::Log, &entry)
                .is_err()
        );
    }
}
