//! Storage accounts in the subscription.

pub mod constants;
pub mod converters;

use tracing::info;

use cloudgraph_shared::Result;

use crate::registry::{BoxFuture, Step, StepContext};
use crate::steps::active_directory::STEP_AD_ACCOUNT;
use crate::steps::resources::{STEP_RM_RESOURCES_RESOURCE_GROUPS, link_resource_group};
use crate::steps::web_linker;

pub use self::constants::*;
use self::converters::*;

fn fetch_storage_accounts<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let count = client
            .iterate_storage_accounts(|account| {
                let key = state
                    .add_entity(create_storage_account_entity(&linker, &account)?)?
                    .key
                    .clone();
                link_resource_group(state, &key)?;
                Ok(())
            })
            .await?;

        info!(count, "storage accounts ingested");
        Ok(())
    })
}

pub fn steps() -> Vec<Step> {
    vec![Step {
        id: STEP_RM_STORAGE_ACCOUNTS,
        name: "Storage Accounts",
        entities: &[STORAGE_ACCOUNT_ENTITY],
        relationships: &[RESOURCE_GROUP_HAS_STORAGE_ACCOUNT],
        depends_on: &[STEP_AD_ACCOUNT, STEP_RM_RESOURCES_RESOURCE_GROUPS],
        handler: fetch_storage_accounts,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::resources::constants::RESOURCE_GROUP_ENTITY;
    use crate::steps::test_support::{SUBSCRIPTION, mock_client, run_handler, state_with_account};
    use cloudgraph_shared::Entity;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn collects_accounts_under_their_resource_group() {
        let server = MockServer::start().await;
        let (config, client) = mock_client(&server).await;

        let group_id = format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev");
        let account_id =
            format!("{group_id}/providers/Microsoft.Storage/storageAccounts/j1devkeyvaultdiagsetstrg");

        Mock::given(method("GET"))
            .and(path(format!(
                "/subscriptions/{SUBSCRIPTION}/providers/Microsoft.Storage/storageAccounts"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{
                    "id": account_id,
                    "name": "j1devkeyvaultdiagsetstrg",
                    "type": "Microsoft.Storage/storageAccounts",
                    "location": "eastus",
                    "kind": "StorageV2",
                    "properties": { "minimumTlsVersion": "TLS1_2" }
                }]
            })))
            .mount(&server)
            .await;

        let mut state = state_with_account();
        state
            .add_entity(
                Entity::new(group_id.clone(), &RESOURCE_GROUP_ENTITY)
                    .with("id", &group_id)
                    .with("name", "j1dev"),
            )
            .unwrap();

        run_handler(fetch_storage_accounts, &config, &client, &mut state)
            .await
            .unwrap();

        let account = state.find_entity(&account_id).unwrap();
        assert_eq!(account.entity_type, STORAGE_ACCOUNT_ENTITY_TYPE);
        assert_eq!(account.str_property("minimumTlsVersion"), Some("TLS1_2"));
        assert_eq!(account.str_property("resourceGroup"), Some("j1dev"));

        let relationships = state.relationships();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].rel_type, "azure_resource_group_has_storage_account");
        assert_eq!(relationships[0].from_key, group_id);
    }
}
