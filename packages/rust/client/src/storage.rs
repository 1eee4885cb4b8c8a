//! Resource Manager: storage accounts in the subscription.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use cloudgraph_shared::Result;

use crate::{Api, AzureClient, Tags};

const STORAGE_API_VERSION: &str = "2019-06-01";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSku {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

/// Service endpoints; absent services are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageEndpoints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dfs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
}

impl StorageEndpoints {
    /// Present endpoints, in a fixed service order.
    pub fn urls(&self) -> Vec<&str> {
        [&self.blob, &self.dfs, &self.file, &self.queue, &self.table, &self.web]
            .into_iter()
            .filter_map(|url| url.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageAccountProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_endpoints: Option<StorageEndpoints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_https_traffic_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_blob_public_access: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_tls_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_hns_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageAccount {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<StorageSku>,
    pub properties: StorageAccountProperties,
}

impl AzureClient {
    #[instrument(skip_all)]
    pub async fn iterate_storage_accounts<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(StorageAccount) -> Result<()>,
    {
        let url = self.management_url(&format!(
            "/subscriptions/{}/providers/Microsoft.Storage/storageAccounts?api-version={STORAGE_API_VERSION}",
            self.subscription_id()?
        ));
        self.iterate_pages(Api::Management, url, each).await
    }
}
