use cloudgraph_client::event_grid::{DomainTopic, EventGridResource, EventSubscription};
use cloudgraph_shared::{Entity, EntitySchema, Result};

use super::constants::*;
use crate::resource_id::resource_group_name;
use crate::steps::{ArmResource, resource_key};
use crate::web_linker::WebLinker;

/// Domains and custom topics share a payload shape.
fn create_event_grid_resource_entity(
    linker: &WebLinker,
    resource: &EventGridResource,
    schema: &EntitySchema,
) -> Result<Entity> {
    let properties = &resource.properties;
    let entity = ArmResource {
        id: resource.id.as_deref(),
        name: resource.name.as_deref(),
        resource_type: resource.resource_type.as_deref(),
        location: resource.location.as_deref(),
        tags: resource.tags.as_ref(),
    }
    .entity(schema, linker, &[])?;

    Ok(entity
        .with("endpoint", &properties.endpoint)
        .with("provisioningState", &properties.provisioning_state)
        .with("inputSchema", &properties.input_schema)
        .with("metricResourceId", &properties.metric_resource_id)
        .with("publicNetworkAccess", &properties.public_network_access)
        .with_raw_data("default", resource))
}

pub fn create_event_grid_domain_entity(
    linker: &WebLinker,
    domain: &EventGridResource,
) -> Result<Entity> {
    create_event_grid_resource_entity(linker, domain, &DOMAIN_ENTITY)
}

pub fn create_event_grid_topic_entity(
    linker: &WebLinker,
    topic: &EventGridResource,
) -> Result<Entity> {
    create_event_grid_resource_entity(linker, topic, &TOPIC_ENTITY)
}

pub fn create_event_grid_domain_topic_entity(
    linker: &WebLinker,
    topic: &DomainTopic,
) -> Result<Entity> {
    let key = resource_key(topic.id.as_deref(), &DOMAIN_TOPIC_ENTITY)?;
    Ok(Entity::new(key, &DOMAIN_TOPIC_ENTITY)
        .with("id", &topic.id)
        .with("name", &topic.name)
        .with("displayName", &topic.name)
        .with("type", &topic.resource_type)
        .with("provisioningState", &topic.properties.provisioning_state)
        .with("resourceGroup", topic.id.as_deref().and_then(resource_group_name))
        .with("webLink", linker.portal_resource_url(topic.id.as_deref()))
        .with_raw_data("default", topic))
}

/// Used for subscriptions of both custom topics and domain topics.
pub fn create_event_grid_topic_subscription_entity(
    linker: &WebLinker,
    subscription: &EventSubscription,
) -> Result<Entity> {
    let properties = &subscription.properties;
    let key = resource_key(subscription.id.as_deref(), &TOPIC_SUBSCRIPTION_ENTITY)?;
    let labels = (!properties.labels.is_empty()).then_some(&properties.labels);

    Ok(Entity::new(key, &TOPIC_SUBSCRIPTION_ENTITY)
        .with("id", &subscription.id)
        .with("name", &subscription.name)
        .with("displayName", &subscription.name)
        .with("type", &subscription.resource_type)
        .with("topic", &properties.topic)
        .with("provisioningState", &properties.provisioning_state)
        .with(
            "destinationEndpointType",
            properties
                .destination
                .as_ref()
                .and_then(|d| d.endpoint_type.as_deref()),
        )
        .with("eventDeliverySchema", &properties.event_delivery_schema)
        .with("expirationTimeUtc", &properties.expiration_time_utc)
        .with("labels", labels)
        .with("webLink", linker.portal_resource_url(subscription.id.as_deref()))
        .with_raw_data("default", subscription))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudgraph_client::event_grid::{
        EventGridResourceProperties, EventSubscriptionDestination, EventSubscriptionProperties,
    };

    const DOMAIN_ID: &str =
        "/subscriptions/s1/resourceGroups/j1dev/providers/Microsoft.EventGrid/domains/d1";

    #[test]
    fn domain_and_topic_share_fields_but_not_types() {
        let resource = EventGridResource {
            id: Some(DOMAIN_ID.into()),
            name: Some("d1".into()),
            location: Some("eastus".into()),
            properties: EventGridResourceProperties {
                endpoint: Some("https://d1.eastus-1.eventgrid.azure.net/api/events".into()),
                input_schema: Some("EventGridSchema".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let linker = WebLinker::new(None);
        let domain = create_event_grid_domain_entity(&linker, &resource).unwrap();
        let topic = create_event_grid_topic_entity(&linker, &resource).unwrap();

        assert_eq!(domain.class, vec!["Service"]);
        assert_eq!(topic.class, vec!["Queue"]);
        assert_eq!(domain.str_property("inputSchema"), Some("EventGridSchema"));
        assert_eq!(domain.str_property("resourceGroup"), Some("j1dev"));
        assert!(domain.property("publicNetworkAccess").is_none());
    }

    #[test]
    fn subscription_destination_and_labels() {
        let subscription = EventSubscription {
            id: Some(format!("{DOMAIN_ID}/topics/t1/providers/Microsoft.EventGrid/eventSubscriptions/s1")),
            name: Some("s1".into()),
            properties: EventSubscriptionProperties {
                destination: Some(EventSubscriptionDestination {
                    endpoint_type: Some("WebHook".into()),
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        let entity =
            create_event_grid_topic_subscription_entity(&WebLinker::new(None), &subscription)
                .unwrap();
        assert_eq!(entity.class, vec!["Subscription"]);
        assert_eq!(entity.str_property("destinationEndpointType"), Some("WebHook"));
        assert!(entity.property("labels").is_none());
    }

    #[test]
    fn domain_topic_fields() {
        let topic = DomainTopic {
            id: Some(format!("{DOMAIN_ID}/topics/t1")),
            name: Some("t1".into()),
            ..Default::default()
        };
        let entity = create_event_grid_domain_topic_entity(&WebLinker::new(None), &topic).unwrap();
        assert_eq!(entity.entity_type, DOMAIN_TOPIC_ENTITY_TYPE);
        assert_eq!(entity.display_name(), Some("t1"));
        assert_eq!(entity.str_property("resourceGroup"), Some("j1dev"));
    }
}
