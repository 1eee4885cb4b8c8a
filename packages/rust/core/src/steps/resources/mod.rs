//! Resource Manager subscriptions and resource groups.

pub mod constants;
pub mod converters;

use tracing::info;

use cloudgraph_shared::Result;

use crate::registry::{BoxFuture, Step, StepContext};
use crate::resource_id::subscription_path;
use crate::steps::active_directory::STEP_AD_ACCOUNT;
use crate::steps::web_linker;

pub use self::constants::{
    RESOURCE_GROUP_ENTITY_TYPE, STEP_RM_RESOURCES_RESOURCE_GROUPS,
    STEP_RM_RESOURCES_SUBSCRIPTIONS, resource_group_has,
};
use self::constants::*;
pub use self::converters::create_resource_group_resource_relationship;
pub(crate) use self::converters::link_resource_group;
use self::converters::*;

fn fetch_subscriptions<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let count = client
            .iterate_subscriptions(|subscription| {
                state.add_entity(create_subscription_entity(&linker, &subscription)?)?;
                Ok(())
            })
            .await?;

        info!(count, "subscriptions ingested");
        Ok(())
    })
}

fn fetch_resource_groups<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let count = client
            .iterate_resource_groups(|group| {
                let entity = create_resource_group_entity(&linker, &group)?;
                let parent = entity
                    .str_property("id")
                    .and_then(subscription_path)
                    .and_then(|path| state.find_entity_ignore_case(path))
                    .map(|subscription| subscription.key.clone());

                let entity = state.add_entity(entity)?;
                let relationship = parent.map(|subscription_key| {
                    SUBSCRIPTION_HAS_RESOURCE_GROUP.create(&subscription_key, &entity.key)
                });
                if let Some(relationship) = relationship {
                    state.link(relationship)?;
                }
                Ok(())
            })
            .await?;

        info!(count, "resource groups ingested");
        Ok(())
    })
}

pub fn steps() -> Vec<Step> {
    vec![
        Step {
            id: STEP_RM_RESOURCES_SUBSCRIPTIONS,
            name: "Subscriptions",
            entities: &[SUBSCRIPTION_ENTITY],
            relationships: &[],
            depends_on: &[STEP_AD_ACCOUNT],
            handler: fetch_subscriptions,
        },
        Step {
            id: STEP_RM_RESOURCES_RESOURCE_GROUPS,
            name: "Resource Groups",
            entities: &[RESOURCE_GROUP_ENTITY],
            relationships: &[SUBSCRIPTION_HAS_RESOURCE_GROUP],
            depends_on: &[STEP_AD_ACCOUNT, STEP_RM_RESOURCES_SUBSCRIPTIONS],
            handler: fetch_resource_groups,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::test_support::{
        SUBSCRIPTION, mock_client, run_handler, state_with_account,
    };
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn resource_groups_linked_to_subscription() {
        let server = MockServer::start().await;
        let (config, client) = mock_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/subscriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{
                    "id": format!("/subscriptions/{SUBSCRIPTION}"),
                    "subscriptionId": SUBSCRIPTION,
                    "displayName": "Dev",
                    "state": "Enabled"
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/subscriptions/{SUBSCRIPTION}/resourcegroups")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{
                    "id": format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev"),
                    "name": "j1dev",
                    "location": "eastus",
                    "tags": { "environment": "dev" },
                    "properties": { "provisioningState": "Succeeded" }
                }]
            })))
            .mount(&server)
            .await;

        let mut state = state_with_account();
        run_handler(fetch_subscriptions, &config, &client, &mut state)
            .await
            .unwrap();
        run_handler(fetch_resource_groups, &config, &client, &mut state)
            .await
            .unwrap();

        let group = state
            .find_entity(&format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev"))
            .unwrap();
        assert_eq!(group.str_property("environment"), Some("dev"));
        assert_eq!(
            group.str_property("webLink"),
            Some(format!(
                "https://portal.azure.com/#@www.fake-domain.com/resource/subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev"
            ).as_str())
        );

        let rel = &state.relationships()[0];
        assert_eq!(rel.rel_type, "azure_subscription_has_resource_group");
        assert_eq!(rel.from_key, format!("/subscriptions/{SUBSCRIPTION}"));
    }

    #[tokio::test]
    async fn resource_groups_without_subscription_entity() {
        let server = MockServer::start().await;
        let (config, client) = mock_client(&server).await;

        Mock::given(method("GET"))
            .and(path(format!("/subscriptions/{SUBSCRIPTION}/resourcegroups")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{ "id": format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/a"), "name": "a" }]
            })))
            .mount(&server)
            .await;

        let mut state = state_with_account();
        run_handler(fetch_resource_groups, &config, &client, &mut state)
            .await
            .unwrap();
        assert_eq!(state.iterate_entities(RESOURCE_GROUP_ENTITY_TYPE).count(), 1);
        assert!(state.relationships().is_empty());
    }
}
