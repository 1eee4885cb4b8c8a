//! Resource Manager: the management group hierarchy below the tenant root.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use cloudgraph_shared::Result;

use crate::{Api, AzureClient};

const MANAGEMENT_GROUPS_API_VERSION: &str = "2020-05-01";

/// `type` of a child that is itself a management group.
pub const MANAGEMENT_GROUP_TYPE: &str = "Microsoft.Management/managementGroups";

/// A node in the expanded hierarchy; may be a group or a subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManagementGroupChild {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub child_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub children: Vec<ManagementGroupChild>,
}

impl ManagementGroupChild {
    pub fn is_management_group(&self) -> bool {
        self.child_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(MANAGEMENT_GROUP_TYPE))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManagementGroupProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub children: Vec<ManagementGroupChild>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagementGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub properties: ManagementGroupProperties,
}

impl AzureClient {
    /// The tenant root group with its whole subtree expanded.
    ///
    /// The root management group shares its name with the directory ID.
    #[instrument(skip_all)]
    pub async fn fetch_management_group_tree(&self) -> Result<ManagementGroup> {
        let url = self.management_url(&format!(
            "/providers/Microsoft.Management/managementGroups/{}?api-version={MANAGEMENT_GROUPS_API_VERSION}&$expand=children&$recurse=true",
            self.directory_id()
        ));
        self.get_json(Api::Management, &url).await
    }
}
