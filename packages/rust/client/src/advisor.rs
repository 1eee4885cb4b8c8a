//! Resource Manager: Azure Advisor recommendations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use cloudgraph_shared::Result;

use crate::{Api, AzureClient};

const ADVISOR_API_VERSION: &str = "2020-01-01";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// ID of the security assessment that raised the recommendation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecommendationProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impacted_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impacted_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<ShortDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_metadata: Option<ResourceMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub properties: RecommendationProperties,
}

impl Recommendation {
    /// ID of the resource the recommendation is about.
    pub fn resource_id(&self) -> Option<&str> {
        self.properties
            .resource_metadata
            .as_ref()
            .and_then(|m| m.resource_id.as_deref())
    }

    /// ID of the assessment that produced the recommendation.
    pub fn source(&self) -> Option<&str> {
        self.properties
            .resource_metadata
            .as_ref()
            .and_then(|m| m.source.as_deref())
    }
}

impl AzureClient {
    #[instrument(skip_all)]
    pub async fn iterate_advisor_recommendations<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(Recommendation) -> Result<()>,
    {
        let url = self.management_url(&format!(
            "/subscriptions/{}/providers/Microsoft.Advisor/recommendations?api-version={ADVISOR_API_VERSION}",
            self.subscription_id()?
        ));
        self.iterate_pages(Api::Management, url, each).await
    }
}
