use cloudgraph_client::advisor::Recommendation;
use cloudgraph_shared::{Entity, Relationship, RelationshipClass, Result};

use super::constants::*;
use crate::steps::{epoch_millis, resource_key};
use crate::web_linker::WebLinker;

pub fn create_recommendation_entity(
    linker: &WebLinker,
    recommendation: &Recommendation,
) -> Result<Entity> {
    let key = resource_key(recommendation.id.as_deref(), &RECOMMENDATION_ENTITY)?;
    let properties = &recommendation.properties;
    let short_description = properties.short_description.as_ref();
    let problem = short_description.and_then(|d| d.problem.as_deref());
    let solution = short_description.and_then(|d| d.solution.as_deref());

    Ok(Entity::new(key, &RECOMMENDATION_ENTITY)
        .with("id", &recommendation.id)
        .with("name", &recommendation.name)
        .with("type", &recommendation.resource_type)
        .with("displayName", problem.or(recommendation.name.as_deref()))
        .with("category", &properties.category)
        .with("impact", &properties.impact)
        .with("severity", properties.impact.as_deref().map(str::to_lowercase))
        .with("impactedField", &properties.impacted_field)
        .with("impactedValue", &properties.impacted_value)
        .with("lastUpdated", epoch_millis(properties.last_updated.as_deref()))
        .with("recommendationTypeId", &properties.recommendation_type_id)
        .with("problem", problem)
        .with("solution", solution)
        .with("resourceId", recommendation.resource_id())
        .with("webLink", linker.portal_resource_url(recommendation.id.as_deref()))
        .with_raw_data("default", recommendation))
}

/// `resource HAS finding`, typed independently of the resource's type.
pub fn create_resource_finding_relationship(resource: &Entity, finding: &Entity) -> Relationship {
    Relationship::between(RelationshipClass::Has, resource, finding)
        .with_type(ANY_RESOURCE_HAS_FINDING.rel_type)
}

pub fn create_assessment_finding_relationship(
    assessment: &Entity,
    finding: &Entity,
) -> Relationship {
    Relationship::between(RelationshipClass::Identified, assessment, finding)
        .with_type(ASSESSMENT_IDENTIFIED_FINDING.rel_type)
}
