use cloudgraph_client::storage::StorageAccount;
use cloudgraph_shared::{Entity, Result};

use super::constants::*;
use crate::steps::ArmResource;
use crate::web_linker::WebLinker;

pub fn create_storage_account_entity(linker: &WebLinker, account: &StorageAccount) -> Result<Entity> {
    let properties = &account.properties;
    let entity = ArmResource {
        id: account.id.as_deref(),
        name: account.name.as_deref(),
        resource_type: account.resource_type.as_deref(),
        location: account.location.as_deref(),
        tags: account.tags.as_ref(),
    }
    .entity(&STORAGE_ACCOUNT_ENTITY, linker, &[])?;

    let endpoints = properties
        .primary_endpoints
        .as_ref()
        .map(|endpoints| endpoints.urls())
        .filter(|urls| !urls.is_empty());

    Ok(entity
        .with("category", ["infrastructure"])
        .with("kind", &account.kind)
        .with("sku", account.sku.as_ref().and_then(|s| s.name.as_deref()))
        .with("skuTier", account.sku.as_ref().and_then(|s| s.tier.as_deref()))
        .with("endpoints", endpoints)
        .with("enableHttpsTrafficOnly", properties.supports_https_traffic_only)
        .with("allowBlobPublicAccess", properties.allow_blob_public_access)
        .with("minimumTlsVersion", &properties.minimum_tls_version)
        .with("isHnsEnabled", properties.is_hns_enabled)
        .with("provisioningState", &properties.provisioning_state)
        .with_raw_data("default", account))
}
