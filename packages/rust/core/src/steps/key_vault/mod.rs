//! Key vaults, listed per ingested resource group.

pub mod constants;
pub mod converters;

use tracing::info;

use cloudgraph_shared::Result;

use crate::registry::{BoxFuture, Step, StepContext};
use crate::steps::active_directory::STEP_AD_ACCOUNT;
use crate::steps::monitor::{
    DIAGNOSTIC_LOG_SETTING_ENTITY, DIAGNOSTIC_LOG_SETTING_USES_STORAGE_ACCOUNT,
    DIAGNOSTIC_METRIC_SETTING_ENTITY, DIAGNOSTIC_METRIC_SETTING_USES_STORAGE_ACCOUNT,
    ingest_diagnostic_settings,
};
use crate::steps::resources::{
    RESOURCE_GROUP_ENTITY_TYPE, STEP_RM_RESOURCES_RESOURCE_GROUPS, link_resource_group,
};
use crate::steps::storage::STEP_RM_STORAGE_ACCOUNTS;
use crate::steps::{ResourceGroupRef, account_entity, web_linker};

pub use self::constants::*;
use self::converters::*;

fn fetch_key_vaults<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let account = account_entity(state)?;
        let linker = web_linker(state)?;

        let groups: Vec<ResourceGroupRef> = state.entities_of_type(RESOURCE_GROUP_ENTITY_TYPE);
        let mut vault_keys = Vec::new();
        for group in &groups {
            client
                .iterate_key_vaults(&group.name, |vault| {
                    let entity = state.add_entity(create_key_vault_entity(&linker, &vault)?)?;
                    let key = entity.key.clone();
                    let relationship = create_account_key_vault_relationship(&account, entity);
                    state.add_relationship(relationship)?;
                    link_resource_group(state, &key)?;
                    vault_keys.push(key);
                    Ok(())
                })
                .await?;
        }

        let mut diagnostic_settings = 0;
        for key in &vault_keys {
            diagnostic_settings +=
                ingest_diagnostic_settings(client, state, &linker, key, &KEY_VAULT_DIAGNOSTIC_LINKS)
                    .await?;
        }

        info!(
            count = vault_keys.len(),
            diagnostic_settings,
            resource_groups = groups.len(),
            "key vaults ingested"
        );
        Ok(())
    })
}

pub fn steps() -> Vec<Step> {
    vec![Step {
        id: STEP_RM_KEYVAULT_VAULTS,
        name: "Key Vaults",
        entities: &[
            KEY_VAULT_SERVICE_ENTITY,
            DIAGNOSTIC_LOG_SETTING_ENTITY,
            DIAGNOSTIC_METRIC_SETTING_ENTITY,
        ],
        relationships: &[
            ACCOUNT_HAS_KEY_VAULT,
            RESOURCE_GROUP_HAS_KEY_VAULT,
            KEY_VAULT_HAS_DIAGNOSTIC_LOG_SETTING,
            KEY_VAULT_HAS_DIAGNOSTIC_METRIC_SETTING,
            DIAGNOSTIC_LOG_SETTING_USES_STORAGE_ACCOUNT,
            DIAGNOSTIC_METRIC_SETTING_USES_STORAGE_ACCOUNT,
        ],
        depends_on: &[
            STEP_AD_ACCOUNT,
            STEP_RM_RESOURCES_RESOURCE_GROUPS,
            STEP_RM_STORAGE_ACCOUNTS,
        ],
        handler: fetch_key_vaults,
    }]
}
