use cloudgraph_client::key_vault::Vault;
use cloudgraph_shared::{Entity, Relationship, Result};

use super::constants::*;
use crate::steps::ArmResource;
use crate::web_linker::WebLinker;

pub fn create_key_vault_entity(linker: &WebLinker, vault: &Vault) -> Result<Entity> {
    let properties = &vault.properties;
    let entity = ArmResource {
        id: vault.id.as_deref(),
        name: vault.name.as_deref(),
        resource_type: vault.resource_type.as_deref(),
        location: vault.location.as_deref(),
        tags: vault.tags.as_ref(),
    }
    .entity(&KEY_VAULT_SERVICE_ENTITY, linker, &[])?;

    Ok(entity
        .with("category", ["infrastructure"])
        .with("endpoints", properties.vault_uri.as_ref().map(|uri| [uri]))
        .with("tenantId", &properties.tenant_id)
        .with("sku", properties.sku.as_ref().and_then(|s| s.name.as_deref()))
        .with("enabledForDeployment", properties.enabled_for_deployment)
        .with("enabledForDiskEncryption", properties.enabled_for_disk_encryption)
        .with("enabledForTemplateDeployment", properties.enabled_for_template_deployment)
        .with("enableSoftDelete", properties.enable_soft_delete)
        .with("enablePurgeProtection", properties.enable_purge_protection)
        .with("enableRbacAuthorization", properties.enable_rbac_authorization)
        .with_raw_data("default", vault))
}

pub fn create_account_key_vault_relationship(account: &Entity, vault: &Entity) -> Relationship {
    ACCOUNT_HAS_KEY_VAULT.create(&account.key, &vault.key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudgraph_client::key_vault::VaultProperties;

    #[test]
    fn vault_without_uri_has_no_endpoints() {
        let vault = Vault {
            id: Some("/subscriptions/s1/resourceGroups/j1dev/providers/Microsoft.KeyVault/vaults/v1".into()),
            name: Some("v1".into()),
            properties: VaultProperties {
                enable_soft_delete: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };

        let entity = create_key_vault_entity(&WebLinker::new(None), &vault).unwrap();
        assert!(entity.property("endpoints").is_none());
        assert_eq!(entity.property("enableSoftDelete"), Some(&serde_json::json!(true)));
        assert!(entity.property("enablePurgeProtection").is_none());
        assert_eq!(entity.property("category"), Some(&serde_json::json!(["infrastructure"])));
    }
}
