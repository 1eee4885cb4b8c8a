//! The management group hierarchy, walked from the tenant root.

pub mod constants;
pub mod converters;

use tracing::{debug, info};

use cloudgraph_client::management_groups::ManagementGroupChild;
use cloudgraph_shared::Result;

use crate::job_state::JobState;
use crate::registry::{BoxFuture, Step, StepContext};
use crate::steps::active_directory::STEP_AD_ACCOUNT;
use crate::steps::{account_entity, web_linker};
use crate::web_linker::WebLinker;

pub use self::constants::*;
use self::converters::*;

/// Adds every management group below `parent_key`, depth first.
fn add_descendants(
    state: &mut JobState,
    linker: &WebLinker,
    parent_key: &str,
    children: &[ManagementGroupChild],
    tenant_id: Option<&str>,
) -> Result<usize> {
    let mut count = 0;
    for child in children {
        if !child.is_management_group() {
            debug!(id = ?child.id, child_type = ?child.child_type, "not a management group, skipping");
            continue;
        }

        let key = state
            .add_entity(create_child_management_group_entity(linker, child, tenant_id)?)?
            .key
            .clone();
        state.add_relationship(MANAGEMENT_GROUP_CONTAINS_MANAGEMENT_GROUP.create(parent_key, &key))?;
        count += 1 + add_descendants(state, linker, &key, &child.children, tenant_id)?;
    }
    Ok(count)
}

fn fetch_management_groups<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let account = account_entity(state)?;
        let linker = web_linker(state)?;

        let root = client.fetch_management_group_tree().await?;
        let root_key = state
            .add_entity(create_management_group_entity(&linker, &root)?)?
            .key
            .clone();
        state.add_relationship(ACCOUNT_HAS_ROOT_MANAGEMENT_GROUP.create(&account.key, &root_key))?;

        let tenant_id = root.properties.tenant_id.as_deref();
        let descendants =
            add_descendants(state, &linker, &root_key, &root.properties.children, tenant_id)?;

        info!(count = descendants + 1, "management groups ingested");
        Ok(())
    })
}

pub fn steps() -> Vec<Step> {
    vec![Step {
        id: STEP_RM_MANAGEMENT_GROUPS,
        name: "Management Groups",
        entities: &[MANAGEMENT_GROUP_ENTITY],
        relationships: &[
            ACCOUNT_HAS_ROOT_MANAGEMENT_GROUP,
            MANAGEMENT_GROUP_CONTAINS_MANAGEMENT_GROUP,
        ],
        depends_on: &[STEP_AD_ACCOUNT],
        handler: fetch_management_groups,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::test_support::{
        ACCOUNT_KEY, DIRECTORY, mock_client, run_handler, state_with_account,
    };
    use cloudgraph_shared::RelationshipClass;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn group_id(name: &str) -> String {
        format!("/providers/Microsoft.Management/managementGroups/{name}")
    }

    fn group(name: &str, children: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": group_id(name),
            "name": name,
            "type": "Microsoft.Management/managementGroups",
            "displayName": name.to_uppercase(),
            "children": children,
        })
    }

    #[tokio::test]
    async fn walks_the_tree_and_skips_subscriptions() {
        let server = MockServer::start().await;
        let (config, client) = mock_client(&server).await;

        Mock::given(method("GET"))
            .and(path(group_id(DIRECTORY)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": group_id(DIRECTORY),
                "name": DIRECTORY,
                "type": "Microsoft.Management/managementGroups",
                "properties": {
                    "tenantId": DIRECTORY,
                    "displayName": "Tenant Root Group",
                    "children": [
                        group("platform", serde_json::json!([
                            group("connectivity", serde_json::json!([])),
                            { "id": "/subscriptions/sub-a", "name": "sub-a", "type": "/subscriptions" }
                        ])),
                        { "id": group_id("sandbox"), "name": "sandbox", "type": "Microsoft.Management/managementGroups" },
                        { "id": "/subscriptions/sub-b", "name": "sub-b", "type": "/subscriptions" }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let mut state = state_with_account();
        run_handler(fetch_management_groups, &config, &client, &mut state)
            .await
            .unwrap();

        assert_eq!(state.iterate_entities(MANAGEMENT_GROUP_ENTITY_TYPE).count(), 4);
        let connectivity = state.find_entity(&group_id("connectivity")).unwrap();
        assert_eq!(connectivity.str_property("tenantId"), Some(DIRECTORY));
        assert_eq!(connectivity.display_name(), Some("CONNECTIVITY"));

        let relationships = state.relationships();
        assert_eq!(relationships.len(), 4);
        assert_eq!(relationships[0].rel_type, "azure_account_has_management_group");
        assert_eq!(relationships[0].from_key, ACCOUNT_KEY);
        assert!(
            relationships[1..]
                .iter()
                .all(|r| r.class == RelationshipClass::Contains
                    && r.rel_type == "azure_management_group_contains_group")
        );
        assert!(relationships.iter().any(|r| r.from_key == group_id("platform")
            && r.to_key == group_id("connectivity")));
    }
}
