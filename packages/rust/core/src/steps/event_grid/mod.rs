//! Event Grid domains, domain topics, custom topics and their event
//! subscriptions.

pub mod constants;
pub mod converters;

use tracing::{debug, info};

use cloudgraph_client::event_grid::DomainTopicLocator;
use cloudgraph_shared::Result;

use crate::registry::{BoxFuture, Step, StepContext};
use crate::resource_id::{event_grid_domain_name, resource_group_name};
use crate::steps::active_directory::STEP_AD_ACCOUNT;
use crate::steps::resources::{
    RESOURCE_GROUP_ENTITY_TYPE, STEP_RM_RESOURCES_RESOURCE_GROUPS, link_resource_group,
};
use crate::steps::{ParentResourceRef, ResourceGroupRef, web_linker};

pub use self::constants::*;
use self::converters::*;

fn fetch_event_grid_domains<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let groups: Vec<ResourceGroupRef> = state.entities_of_type(RESOURCE_GROUP_ENTITY_TYPE);
        let mut count = 0;
        for group in &groups {
            count += client
                .iterate_event_grid_domains(&group.name, |domain| {
                    let key = state
                        .add_entity(create_event_grid_domain_entity(&linker, &domain)?)?
                        .key
                        .clone();
                    link_resource_group(state, &key)?;
                    Ok(())
                })
                .await?;
        }

        info!(count, "event grid domains ingested");
        Ok(())
    })
}

fn fetch_event_grid_domain_topics<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let domains: Vec<ParentResourceRef> = state.entities_of_type(DOMAIN_ENTITY_TYPE);
        let mut count = 0;
        for domain in &domains {
            count += client
                .iterate_event_grid_domain_topics(&domain.id, |topic| {
                    let entity = state.add_entity(create_event_grid_domain_topic_entity(&linker, &topic)?)?;
                    let relationship = DOMAIN_HAS_DOMAIN_TOPIC.create(&domain.key, &entity.key);
                    state.add_relationship(relationship)
                })
                .await?;
        }

        info!(count, "event grid domain topics ingested");
        Ok(())
    })
}

fn fetch_event_grid_domain_topic_subscriptions<'a>(
    ctx: &'a mut StepContext<'_>,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let topics: Vec<ParentResourceRef> = state.entities_of_type(DOMAIN_TOPIC_ENTITY_TYPE);
        let mut count = 0;
        for topic in &topics {
            let (Some(group), Some(domain)) =
                (resource_group_name(&topic.id), event_grid_domain_name(&topic.id))
            else {
                debug!(id = %topic.id, "domain topic id without resource group or domain, skipping");
                continue;
            };
            let locator = DomainTopicLocator {
                resource_group_name: group,
                domain_name: domain,
                domain_topic_name: &topic.name,
            };

            count += client
                .iterate_event_grid_domain_topic_subscriptions(&locator, |subscription| {
                    let entity = state.add_entity(create_event_grid_topic_subscription_entity(
                        &linker,
                        &subscription,
                    )?)?;
                    let relationship = DOMAIN_TOPIC_HAS_SUBSCRIPTION.create(&topic.key, &entity.key);
                    state.add_relationship(relationship)
                })
                .await?;
        }

        info!(count, "event grid domain topic subscriptions ingested");
        Ok(())
    })
}

fn fetch_event_grid_topics<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let groups: Vec<ResourceGroupRef> = state.entities_of_type(RESOURCE_GROUP_ENTITY_TYPE);
        let mut count = 0;
        for group in &groups {
            count += client
                .iterate_event_grid_topics(&group.name, |topic| {
                    let key = state
                        .add_entity(create_event_grid_topic_entity(&linker, &topic)?)?
                        .key
                        .clone();
                    link_resource_group(state, &key)?;
                    Ok(())
                })
                .await?;
        }

        info!(count, "event grid topics ingested");
        Ok(())
    })
}

fn fetch_event_grid_topic_subscriptions<'a>(
    ctx: &'a mut StepContext<'_>,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let linker = web_linker(state)?;

        let topics: Vec<ParentResourceRef> = state.entities_of_type(TOPIC_ENTITY_TYPE);
        let mut count = 0;
        for topic in &topics {
            count += client
                .iterate_event_grid_topic_subscriptions(&topic.id, |subscription| {
                    let entity = state.add_entity(create_event_grid_topic_subscription_entity(
                        &linker,
                        &subscription,
                    )?)?;
                    let relationship = TOPIC_HAS_SUBSCRIPTION.create(&topic.key, &entity.key);
                    state.add_relationship(relationship)
                })
                .await?;
        }

        info!(count, "event grid topic subscriptions ingested");
        Ok(())
    })
}

pub fn steps() -> Vec<Step> {
    vec![
        Step {
            id: STEP_RM_EVENT_GRID_DOMAINS,
            name: "Event Grid Domains",
            entities: &[DOMAIN_ENTITY],
            relationships: &[RESOURCE_GROUP_HAS_DOMAIN],
            depends_on: &[STEP_AD_ACCOUNT, STEP_RM_RESOURCES_RESOURCE_GROUPS],
            handler: fetch_event_grid_domains,
        },
        Step {
            id: STEP_RM_EVENT_GRID_DOMAIN_TOPICS,
            name: "Event Grid Domain Topics",
            entities: &[DOMAIN_TOPIC_ENTITY],
            relationships: &[DOMAIN_HAS_DOMAIN_TOPIC],
            depends_on: &[
                STEP_AD_ACCOUNT,
                STEP_RM_RESOURCES_RESOURCE_GROUPS,
                STEP_RM_EVENT_GRID_DOMAINS,
            ],
            handler: fetch_event_grid_domain_topics,
        },
        Step {
            id: STEP_RM_EVENT_GRID_DOMAIN_TOPIC_SUBSCRIPTIONS,
            name: "Event Grid Domain Topic Subscriptions",
            entities: &[TOPIC_SUBSCRIPTION_ENTITY],
            relationships: &[DOMAIN_TOPIC_HAS_SUBSCRIPTION],
            depends_on: &[
                STEP_AD_ACCOUNT,
                STEP_RM_RESOURCES_RESOURCE_GROUPS,
                STEP_RM_EVENT_GRID_DOMAINS,
                STEP_RM_EVENT_GRID_DOMAIN_TOPICS,
            ],
            handler: fetch_event_grid_domain_topic_subscriptions,
        },
        Step {
            id: STEP_RM_EVENT_GRID_TOPICS,
            name: "Event Grid Topics",
            entities: &[TOPIC_ENTITY],
            relationships: &[RESOURCE_GROUP_HAS_TOPIC],
            depends_on: &[STEP_AD_ACCOUNT, STEP_RM_RESOURCES_RESOURCE_GROUPS],
            handler: fetch_event_grid_topics,
        },
        Step {
            id: STEP_RM_EVENT_GRID_TOPIC_SUBSCRIPTIONS,
            name: "Event Grid Topic Subscriptions",
            entities: &[TOPIC_SUBSCRIPTION_ENTITY],
            relationships: &[TOPIC_HAS_SUBSCRIPTION],
            depends_on: &[
                STEP_AD_ACCOUNT,
                STEP_RM_RESOURCES_RESOURCE_GROUPS,
                STEP_RM_EVENT_GRID_TOPICS,
            ],
            handler: fetch_event_grid_topic_subscriptions,
        },
    ]
}
