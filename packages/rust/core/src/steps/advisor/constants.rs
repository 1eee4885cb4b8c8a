use cloudgraph_shared::{EntitySchema, RelationshipClass, RelationshipSchema};

pub const STEP_RM_ADVISOR_RECOMMENDATIONS: &str = "rm-advisor-recommendations";

pub const RECOMMENDATION_ENTITY_TYPE: &str = "azure_advisor_recommendation";

/// Source type of links whose source may be any ingested resource.
pub const ANY_RESOURCE: &str = "ANY_RESOURCE";

/// Security Center assessments are not ingested by any step here; findings
/// link to them only when such entities already exist in the job state.
pub const SECURITY_ASSESSMENT_ENTITY_TYPE: &str = "azure_security_assessment";

pub const RECOMMENDATION_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Advisor Recommendation",
    entity_type: RECOMMENDATION_ENTITY_TYPE,
    class: &["Finding"],
};

pub const ANY_RESOURCE_HAS_FINDING: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_resource_has_advisor_recommendation",
    source_type: ANY_RESOURCE,
    class: RelationshipClass::Has,
    target_type: RECOMMENDATION_ENTITY_TYPE,
};

pub const ASSESSMENT_IDENTIFIED_FINDING: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_security_assessment_identified_advisor_recommendation",
    source_type: SECURITY_ASSESSMENT_ENTITY_TYPE,
    class: RelationshipClass::Identified,
    target_type: RECOMMENDATION_ENTITY_TYPE,
};
