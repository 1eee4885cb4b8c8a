//! Resource Manager: subscriptions and resource groups.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use cloudgraph_shared::Result;

use crate::{Api, AzureClient, Tags};

const SUBSCRIPTIONS_API_VERSION: &str = "2020-01-01";
const RESOURCE_GROUPS_API_VERSION: &str = "2021-04-01";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Subscription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    pub properties: ResourceGroupProperties,
}

impl AzureClient {
    /// Every subscription the credentials can see.
    #[instrument(skip_all)]
    pub async fn iterate_subscriptions<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(Subscription) -> Result<()>,
    {
        let url = self.management_url(&format!(
            "/subscriptions?api-version={SUBSCRIPTIONS_API_VERSION}"
        ));
        self.iterate_pages(Api::Management, url, each).await
    }

    /// Resource groups of the configured subscription.
    #[instrument(skip_all)]
    pub async fn iterate_resource_groups<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(ResourceGroup) -> Result<()>,
    {
        let url = self.management_url(&format!(
            "/subscriptions/{}/resourcegroups?api-version={RESOURCE_GROUPS_API_VERSION}",
            self.subscription_id()?
        ));
        self.iterate_pages(Api::Management, url, each).await
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{SUBSCRIPTION, client_for};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn iterates_resource_groups_of_configured_subscription() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path(format!("/subscriptions/{SUBSCRIPTION}/resourcegroups")))
            .and(query_param("api-version", "2021-04-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{
                    "id": format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev"),
                    "name": "j1dev",
                    "type": "Microsoft.Resources/resourceGroups",
                    "location": "eastus",
                    "tags": { "environment": "j1dev" },
                    "properties": { "provisioningState": "Succeeded" }
                }]
            })))
            .mount(&server)
            .await;

        let mut groups = Vec::new();
        client
            .iterate_resource_groups(|rg| {
                groups.push(rg);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name.as_deref(), Some("j1dev"));
        assert_eq!(groups[0].properties.provisioning_state.as_deref(), Some("Succeeded"));
        assert_eq!(
            groups[0].tags.as_ref().and_then(|t| t.get("environment")).map(String::as_str),
            Some("j1dev")
        );
    }
}
