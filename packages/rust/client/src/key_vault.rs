//! Resource Manager: key vaults, listed per resource group.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use cloudgraph_shared::Result;

use crate::{Api, AzureClient, Tags};

const KEY_VAULT_API_VERSION: &str = "2019-09-01";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSku {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VaultProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<VaultSku>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_for_deployment: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_for_disk_encryption: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_for_template_deployment: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_soft_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_purge_protection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_rbac_authorization: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vault {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    pub properties: VaultProperties,
}

impl AzureClient {
    #[instrument(skip_all, fields(resource_group = resource_group_name))]
    pub async fn iterate_key_vaults<F>(&self, resource_group_name: &str, each: F) -> Result<usize>
    where
        F: FnMut(Vault) -> Result<()>,
    {
        let url = self.management_url(&format!(
            "/subscriptions/{}/resourceGroups/{resource_group_name}/providers/Microsoft.KeyVault/vaults?api-version={KEY_VAULT_API_VERSION}",
            self.subscription_id()?
        ));
        self.iterate_pages(Api::Management, url, each).await
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{SUBSCRIPTION, client_for};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lists_vaults_in_resource_group() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path(format!(
                "/subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev/providers/Microsoft.KeyVault/vaults"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{
                    "id": format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev/providers/Microsoft.KeyVault/vaults/keionned1-j1dev"),
                    "name": "keionned1-j1dev",
                    "location": "eastus",
                    "properties": { "vaultUri": "https://keionned1-j1dev.vault.azure.net/" }
                }]
            })))
            .mount(&server)
            .await;

        let mut vaults = Vec::new();
        client
            .iterate_key_vaults("j1dev", |vault| {
                vaults.push(vault);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(vaults.len(), 1);
        assert_eq!(
            vaults[0].properties.vault_uri.as_deref(),
            Some("https://keionned1-j1dev.vault.azure.net/")
        );
    }
}
