//! Azure Monitor: diagnostic settings attached to a resource.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use cloudgraph_shared::Result;

use crate::{Api, AzureClient};

const DIAGNOSTIC_SETTINGS_API_VERSION: &str = "2021-05-01-preview";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    pub enabled: bool,
    pub days: u32,
}

/// One log category or metric category of a setting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CategorySetting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_grain: Option<String>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_policy: Option<RetentionPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagnosticSettingsProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_bus_rule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_hub_authorization_rule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_hub_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_analytics_destination_type: Option<String>,
    pub logs: Vec<CategorySetting>,
    pub metrics: Vec<CategorySetting>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticSettingsResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub properties: DiagnosticSettingsProperties,
}

impl AzureClient {
    /// Diagnostic settings of the resource with ARM ID `resource_id`.
    #[instrument(skip_all)]
    pub async fn fetch_diagnostic_settings(
        &self,
        resource_id: &str,
    ) -> Result<Vec<DiagnosticSettingsResource>> {
        let url = self.resource_url(
            resource_id,
            &format!(
                "/providers/microsoft.insights/diagnosticSettings?api-version={DIAGNOSTIC_SETTINGS_API_VERSION}"
            ),
        );
        let mut settings: Vec<DiagnosticSettingsResource> = Vec::new();
        self.iterate_pages(Api::Management, url, |setting| {
            settings.push(setting);
            Ok(())
        })
        .await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{SUBSCRIPTION, client_for};
    use wiremock::matchers::{method, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_settings_scoped_to_resource() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        let vault_id = format!(
            "/subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev/providers/Microsoft.KeyVault/vaults/keionned1-j1dev"
        );

        Mock::given(method("GET"))
            .and(path_regex(
                r"/Microsoft\.KeyVault/vaults/keionned1-j1dev/providers/microsoft\.insights/diagnosticSettings$",
            ))
            .and(query_param("api-version", "2021-05-01-preview"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{
                    "id": format!("{vault_id}/providers/microsoft.insights/diagnosticSettings/j1dev_key_vault_diag_set"),
                    "name": "j1dev_key_vault_diag_set",
                    "properties": {
                        "storageAccountId": format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev/providers/Microsoft.Storage/storageAccounts/j1devkeyvaultdiagsetstrg"),
                        "logs": [{
                            "category": "AuditEvent",
                            "enabled": true,
                            "retentionPolicy": { "enabled": true, "days": 7 }
                        }],
                        "metrics": [{
                            "category": "AllMetrics",
                            "timeGrain": null,
                            "enabled": true,
                            "retentionPolicy": { "enabled": true, "days": 7 }
                        }]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = client.fetch_diagnostic_settings(&vault_id).await.unwrap();

        assert_eq!(settings.len(), 1);
        let properties = &settings[0].properties;
        assert!(properties.workspace_id.is_none());
        assert_eq!(properties.logs[0].category.as_deref(), Some("AuditEvent"));
        assert_eq!(
            properties.logs[0].retention_policy,
            Some(super::RetentionPolicy { enabled: true, days: 7 })
        );
        assert_eq!(properties.metrics.len(), 1);
        assert!(properties.metrics[0].time_grain.is_none());
    }

    #[tokio::test]
    async fn resource_without_settings_yields_empty_list() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path_regex(r"/providers/microsoft\.insights/diagnosticSettings$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": [] })))
            .mount(&server)
            .await;

        let settings = client
            .fetch_diagnostic_settings("/subscriptions/s1/resourceGroups/j1dev/providers/Microsoft.KeyVault/vaults/v1")
            .await
            .unwrap();
        assert!(settings.is_empty());
    }
}
