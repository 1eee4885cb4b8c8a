use cloudgraph_client::resources::{ResourceGroup, Subscription};
use cloudgraph_shared::{Entity, Relationship, RelationshipClass, Result};
use tracing::debug;

use super::constants::*;
use crate::job_state::{JobState, LinkOutcome};
use crate::resource_id::resource_group_id;
use crate::steps::{ArmResource, resource_key};
use crate::web_linker::WebLinker;

pub fn create_subscription_entity(linker: &WebLinker, subscription: &Subscription) -> Result<Entity> {
    let key = resource_key(subscription.id.as_deref(), &SUBSCRIPTION_ENTITY)?;
    Ok(Entity::new(key, &SUBSCRIPTION_ENTITY)
        .with("id", &subscription.id)
        .with("subscriptionId", &subscription.subscription_id)
        .with("tenantId", &subscription.tenant_id)
        .with("name", &subscription.display_name)
        .with("displayName", &subscription.display_name)
        .with("state", &subscription.state)
        .with("authorizationSource", &subscription.authorization_source)
        .with("webLink", linker.portal_resource_url(subscription.id.as_deref()))
        .with_raw_data("default", subscription))
}

pub fn create_resource_group_entity(linker: &WebLinker, group: &ResourceGroup) -> Result<Entity> {
    let entity = ArmResource {
        id: group.id.as_deref(),
        name: group.name.as_deref(),
        resource_type: group.resource_type.as_deref(),
        location: group.location.as_deref(),
        tags: group.tags.as_ref(),
    }
    .entity(&RESOURCE_GROUP_ENTITY, linker, &["environment"])?;

    Ok(entity
        .with("managedBy", &group.managed_by)
        .with("provisioningState", &group.properties.provisioning_state)
        .with_raw_data("default", group))
}

/// `resource_group HAS resource`, where the group is found from the
/// resource's ID. `None` when that group was never ingested.
pub fn create_resource_group_resource_relationship(
    state: &JobState,
    resource: &Entity,
) -> Option<Relationship> {
    let id = resource.str_property("id").unwrap_or(&resource.key);
    let group = state.find_entity_ignore_case(resource_group_id(id)?)?;
    Some(Relationship::between(RelationshipClass::Has, group, resource))
}

/// Link a stored resource to its resource group, if that group is known.
pub(crate) fn link_resource_group(state: &mut JobState, resource_key: &str) -> Result<LinkOutcome> {
    let relationship = state
        .find_entity(resource_key)
        .and_then(|resource| create_resource_group_resource_relationship(state, resource));

    match relationship {
        Some(relationship) => state.link(relationship),
        None => {
            debug!(key = resource_key, "resource group not found, skipping");
            Ok(LinkOutcome::TargetNotFound)
        }
    }
}
