//! Azure Advisor recommendations, linked to the resources they concern.

pub mod constants;
pub mod converters;

use tracing::info;

use cloudgraph_shared::{Entity, Relationship, Result};

use crate::job_state::{JobState, LinkOutcome};
use crate::registry::{BoxFuture, Step, StepContext};
use crate::steps::active_directory::STEP_AD_ACCOUNT;
use crate::steps::event_grid::{
    STEP_RM_EVENT_GRID_DOMAIN_TOPIC_SUBSCRIPTIONS, STEP_RM_EVENT_GRID_DOMAIN_TOPICS,
    STEP_RM_EVENT_GRID_DOMAINS, STEP_RM_EVENT_GRID_TOPIC_SUBSCRIPTIONS, STEP_RM_EVENT_GRID_TOPICS,
};
use crate::steps::key_vault::STEP_RM_KEYVAULT_VAULTS;
use crate::steps::management_groups::STEP_RM_MANAGEMENT_GROUPS;
use crate::steps::network::{
    STEP_RM_NETWORK_INTERFACES, STEP_RM_NETWORK_LOAD_BALANCERS,
    STEP_RM_NETWORK_PUBLIC_IP_ADDRESSES, STEP_RM_NETWORK_SECURITY_GROUPS,
    STEP_RM_NETWORK_VIRTUAL_NETWORKS,
};
use crate::steps::resources::{STEP_RM_RESOURCES_RESOURCE_GROUPS, STEP_RM_RESOURCES_SUBSCRIPTIONS};
use crate::steps::storage::STEP_RM_STORAGE_ACCOUNTS;
use crate::steps::web_linker;

pub use self::constants::*;
use self::converters::*;

/// Link `finding` from the entity whose key matches `source_id`, if one was
/// ingested.
fn link_from(
    state: &mut JobState,
    source_id: Option<&str>,
    finding: &Entity,
    build: fn(&Entity, &Entity) -> Relationship,
) -> Result<LinkOutcome> {
    let Some(source) = source_id.and_then(|id| state.find_entity_ignore_case(id)) else {
        return Ok(LinkOutcome::TargetNotFound);
    };
    let relationship = build(source, finding);
    state.link(relationship)
}

fn fetch_recommendations<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let mut linked = 0;
        let count = client
            .iterate_advisor_recommendations(|recommendation| {
                let finding = state
                    .add_entity(create_recommendation_entity(&linker, &recommendation)?)?
                    .clone();

                // Resolves only when assessment entities were seeded into the state.
                link_from(
                    state,
                    recommendation.source(),
                    &finding,
                    create_assessment_finding_relationship,
                )?;
                if link_from(
                    state,
                    recommendation.resource_id(),
                    &finding,
                    create_resource_finding_relationship,
                )? == LinkOutcome::Linked
                {
                    linked += 1;
                }
                Ok(())
            })
            .await?;

        info!(count, linked, "advisor recommendations ingested");
        Ok(())
    })
}

pub fn steps() -> Vec<Step> {
    vec![Step {
        id: STEP_RM_ADVISOR_RECOMMENDATIONS,
        name: "Recommendations",
        entities: &[RECOMMENDATION_ENTITY],
        relationships: &[ASSESSMENT_IDENTIFIED_FINDING, ANY_RESOURCE_HAS_FINDING],
        depends_on: &[
            STEP_AD_ACCOUNT,
            STEP_RM_RESOURCES_SUBSCRIPTIONS,
            STEP_RM_RESOURCES_RESOURCE_GROUPS,
            STEP_RM_NETWORK_INTERFACES,
            STEP_RM_NETWORK_PUBLIC_IP_ADDRESSES,
            STEP_RM_NETWORK_VIRTUAL_NETWORKS,
            STEP_RM_NETWORK_SECURITY_GROUPS,
            STEP_RM_NETWORK_LOAD_BALANCERS,
            STEP_RM_STORAGE_ACCOUNTS,
            STEP_RM_KEYVAULT_VAULTS,
            STEP_RM_EVENT_GRID_DOMAINS,
            STEP_RM_EVENT_GRID_DOMAIN_TOPICS,
            STEP_RM_EVENT_GRID_DOMAIN_TOPIC_SUBSCRIPTIONS,
            STEP_RM_EVENT_GRID_TOPICS,
            STEP_RM_EVENT_GRID_TOPIC_SUBSCRIPTIONS,
            STEP_RM_MANAGEMENT_GROUPS,
        ],
        handler: fetch_recommendations,
    }]
}
