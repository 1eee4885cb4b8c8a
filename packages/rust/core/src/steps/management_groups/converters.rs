use cloudgraph_client::management_groups::{ManagementGroup, ManagementGroupChild};
use cloudgraph_shared::{Entity, Result};

use super::constants::*;
use crate::steps::resource_key;
use crate::web_linker::WebLinker;

/// The tenant root group as returned by the expanded fetch.
pub fn create_management_group_entity(
    linker: &WebLinker,
    group: &ManagementGroup,
) -> Result<Entity> {
    let key = resource_key(group.id.as_deref(), &MANAGEMENT_GROUP_ENTITY)?;
    let display_name = group
        .properties
        .display_name
        .as_deref()
        .or(group.name.as_deref());

    Ok(Entity::new(key, &MANAGEMENT_GROUP_ENTITY)
        .with("id", &group.id)
        .with("name", &group.name)
        .with("type", &group.resource_type)
        .with("displayName", display_name)
        .with("tenantId", &group.properties.tenant_id)
        .with("webLink", linker.portal_resource_url(group.id.as_deref()))
        .with_raw_data("default", group))
}

/// A descendant group. Children don't repeat the tenant, so it is taken from
/// the root.
pub fn create_child_management_group_entity(
    linker: &WebLinker,
    child: &ManagementGroupChild,
    tenant_id: Option<&str>,
) -> Result<Entity> {
    let key = resource_key(child.id.as_deref(), &MANAGEMENT_GROUP_ENTITY)?;
    let display_name = child.display_name.as_deref().or(child.name.as_deref());

    // The subtree is stored on its own entities.
    let own = ManagementGroupChild {
        children: Vec::new(),
        ..child.clone()
    };

    Ok(Entity::new(key, &MANAGEMENT_GROUP_ENTITY)
        .with("id", &child.id)
        .with("name", &child.name)
        .with("type", &child.child_type)
        .with("displayName", display_name)
        .with("tenantId", tenant_id)
        .with("webLink", linker.portal_resource_url(child.id.as_deref()))
        .with_raw_data("default", own))
}
