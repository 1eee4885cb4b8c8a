use cloudgraph_shared::{EntitySchema, RelationshipClass, RelationshipSchema};

use crate::steps::resources::resource_group_has;

pub const STEP_RM_EVENT_GRID_DOMAINS: &str = "rm-event-grid-domains";
pub const STEP_RM_EVENT_GRID_DOMAIN_TOPICS: &str = "rm-event-grid-domain-topics";
pub const STEP_RM_EVENT_GRID_DOMAIN_TOPIC_SUBSCRIPTIONS: &str =
    "rm-event-grid-domain-topic-subscriptions";
pub const STEP_RM_EVENT_GRID_TOPICS: &str = "rm-event-grid-topics";
pub const STEP_RM_EVENT_GRID_TOPIC_SUBSCRIPTIONS: &str = "rm-event-grid-topic-subscriptions";

pub const DOMAIN_ENTITY_TYPE: &str = "azure_event_grid_domain";
pub const DOMAIN_TOPIC_ENTITY_TYPE: &str = "azure_event_grid_domain_topic";
pub const TOPIC_ENTITY_TYPE: &str = "azure_event_grid_topic";
pub const TOPIC_SUBSCRIPTION_ENTITY_TYPE: &str = "azure_event_grid_topic_subscription";

pub const DOMAIN_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Event Grid Domain",
    entity_type: DOMAIN_ENTITY_TYPE,
    class: &["Service"],
};

pub const DOMAIN_TOPIC_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Event Grid Domain Topic",
    entity_type: DOMAIN_TOPIC_ENTITY_TYPE,
    class: &["Queue"],
};

pub const TOPIC_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Event Grid Topic",
    entity_type: TOPIC_ENTITY_TYPE,
    class: &["Queue"],
};

pub const TOPIC_SUBSCRIPTION_ENTITY: EntitySchema = EntitySchema {
    resource_name: "[RM] Event Grid Topic Subscription",
    entity_type: TOPIC_SUBSCRIPTION_ENTITY_TYPE,
    class: &["Subscription"],
};

pub const RESOURCE_GROUP_HAS_DOMAIN: RelationshipSchema =
    resource_group_has("azure_resource_group_has_event_grid_domain", DOMAIN_ENTITY_TYPE);

pub const RESOURCE_GROUP_HAS_TOPIC: RelationshipSchema =
    resource_group_has("azure_resource_group_has_event_grid_topic", TOPIC_ENTITY_TYPE);

pub const DOMAIN_HAS_DOMAIN_TOPIC: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_event_grid_domain_has_topic",
    source_type: DOMAIN_ENTITY_TYPE,
    class: RelationshipClass::Has,
    target_type: DOMAIN_TOPIC_ENTITY_TYPE,
};

pub const DOMAIN_TOPIC_HAS_SUBSCRIPTION: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_event_grid_domain_topic_has_topic_subscription",
    source_type: DOMAIN_TOPIC_ENTITY_TYPE,
    class: RelationshipClass::Has,
    target_type: TOPIC_SUBSCRIPTION_ENTITY_TYPE,
};

pub const TOPIC_HAS_SUBSCRIPTION: RelationshipSchema = RelationshipSchema {
    rel_type: "azure_event_grid_topic_has_subscription",
    source_type: TOPIC_ENTITY_TYPE,
    class: RelationshipClass::Has,
    target_type: TOPIC_SUBSCRIPTION_ENTITY_TYPE,
};
