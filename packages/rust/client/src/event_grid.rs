//! Resource Manager: Event Grid domains, topics and event subscriptions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use cloudgraph_shared::Result;

use crate::{Api, AzureClient, Tags};

const EVENT_GRID_API_VERSION: &str = "2020-06-01";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventGridResourceProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_network_access: Option<String>,
}

/// A domain or a custom topic; both share this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventGridResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    pub properties: EventGridResourceProperties,
}

pub type EventGridDomain = EventGridResource;
pub type EventGridTopic = EventGridResource;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DomainTopicProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainTopic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub properties: DomainTopicProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventSubscriptionDestination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventSubscriptionProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<EventSubscriptionDestination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_delivery_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time_utc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<Value>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSubscription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub properties: EventSubscriptionProperties,
}

/// Coordinates of a domain topic, used to list its subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainTopicLocator<'a> {
    pub resource_group_name: &'a str,
    pub domain_name: &'a str,
    pub domain_topic_name: &'a str,
}

impl AzureClient {
    fn event_grid_url(&self, resource_group_name: &str, path: &str) -> Result<String> {
        Ok(self.management_url(&format!(
            "/subscriptions/{}/resourceGroups/{resource_group_name}/providers/Microsoft.EventGrid/{path}?api-version={EVENT_GRID_API_VERSION}",
            self.subscription_id()?
        )))
    }

    #[instrument(skip_all, fields(resource_group = resource_group_name))]
    pub async fn iterate_event_grid_domains<F>(&self, resource_group_name: &str, each: F) -> Result<usize>
    where
        F: FnMut(EventGridDomain) -> Result<()>,
    {
        let url = self.event_grid_url(resource_group_name, "domains")?;
        self.iterate_pages(Api::Management, url, each).await
    }

    /// Topics of a domain, addressed by the domain's resource ID.
    #[instrument(skip_all)]
    pub async fn iterate_event_grid_domain_topics<F>(&self, domain_id: &str, each: F) -> Result<usize>
    where
        F: FnMut(DomainTopic) -> Result<()>,
    {
        let url = self.resource_url(
            domain_id,
            &format!("/topics?api-version={EVENT_GRID_API_VERSION}"),
        );
        self.iterate_pages(Api::Management, url, each).await
    }

    #[instrument(skip_all, fields(domain = locator.domain_name, topic = locator.domain_topic_name))]
    pub async fn iterate_event_grid_domain_topic_subscriptions<F>(
        &self,
        locator: &DomainTopicLocator<'_>,
        each: F,
    ) -> Result<usize>
    where
        F: FnMut(EventSubscription) -> Result<()>,
    {
        let url = self.event_grid_url(
            locator.resource_group_name,
            &format!(
                "domains/{}/topics/{}/providers/Microsoft.EventGrid/eventSubscriptions",
                locator.domain_name, locator.domain_topic_name
            ),
        )?;
        self.iterate_pages(Api::Management, url, each).await
    }

    #[instrument(skip_all, fields(resource_group = resource_group_name))]
    pub async fn iterate_event_grid_topics<F>(&self, resource_group_name: &str, each: F) -> Result<usize>
    where
        F: FnMut(EventGridTopic) -> Result<()>,
    {
        let url = self.event_grid_url(resource_group_name, "topics")?;
        self.iterate_pages(Api::Management, url, each).await
    }

    /// Event subscriptions of a custom topic, addressed by the topic's resource ID.
    #[instrument(skip_all)]
    pub async fn iterate_event_grid_topic_subscriptions<F>(&self, topic_id: &str, each: F) -> Result<usize>
    where
        F: FnMut(EventSubscription) -> Result<()>,
    {
        let url = self.resource_url(
            topic_id,
            &format!(
                "/providers/Microsoft.EventGrid/eventSubscriptions?api-version={EVENT_GRID_API_VERSION}"
            ),
        );
        self.iterate_pages(Api::Management, url, each).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{SUBSCRIPTION, client_for};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lists_domain_topics_by_domain_id() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path_regex(r"/resourceGroups/j1dev/providers/Microsoft\.EventGrid/domains/d1/topics$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{ "id": "topic-id", "name": "t1", "properties": { "provisioningState": "Succeeded" } }]
            })))
            .mount(&server)
            .await;

        let domain_id = format!(
            "/subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev/providers/Microsoft.EventGrid/domains/d1"
        );
        let mut names = Vec::new();
        client
            .iterate_event_grid_domain_topics(&domain_id, |topic| {
                names.push(topic.name.unwrap_or_default());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(names, vec!["t1"]);
    }

    #[tokio::test]
    async fn lists_domain_topic_subscriptions_by_locator() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path(format!(
                "/subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev/providers/Microsoft.EventGrid/domains/d1/topics/t1/providers/Microsoft.EventGrid/eventSubscriptions"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{
                    "id": "sub-id",
                    "name": "s1",
                    "properties": { "destination": { "endpointType": "WebHook" } }
                }]
            })))
            .mount(&server)
            .await;

        let locator = DomainTopicLocator {
            resource_group_name: "j1dev",
            domain_name: "d1",
            domain_topic_name: "t1",
        };
        let mut subs = Vec::new();
        client
            .iterate_event_grid_domain_topic_subscriptions(&locator, |sub| {
                subs.push(sub);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(subs.len(), 1);
        assert_eq!(
            subs[0]
                .properties
                .destination
                .as_ref()
                .and_then(|d| d.endpoint_type.as_deref()),
            Some("WebHook")
        );
    }
}
