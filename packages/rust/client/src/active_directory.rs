//! Microsoft Graph: organization, users, groups and service principals.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use cloudgraph_shared::Result;

use crate::{Api, AzureClient};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifiedDomain {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_initial: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Organization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub verified_domains: Vec<VerifiedDomain>,
}

/// `identitySecurityDefaultsEnforcementPolicy`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityDefaultsPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Group {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewed_date_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServicePrincipal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_principal_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_enabled: Option<bool>,
    pub service_principal_names: Vec<String>,
    /// Graph tags are bare strings, not key/value pairs.
    pub tags: Vec<String>,
}

/// Per-user MFA registration status (beta reports API).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CredentialUserRegistrationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_display_name: Option<String>,
    pub auth_methods: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_registered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_capable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mfa_registered: Option<bool>,
}

impl AzureClient {
    /// The tenant's organization record, if Graph returns one.
    #[instrument(skip_all)]
    pub async fn fetch_organization(&self) -> Result<Option<Organization>> {
        let mut first = None;
        self.iterate_pages(Api::Graph, self.graph_url("/v1.0/organization"), |org| {
            if first.is_none() {
                first = Some(org);
            }
            Ok(())
        })
        .await?;
        Ok(first)
    }

    #[instrument(skip_all)]
    pub async fn fetch_security_defaults_policy(&self) -> Result<SecurityDefaultsPolicy> {
        self.get_json(
            Api::Graph,
            &self.graph_url("/v1.0/policies/identitySecurityDefaultsEnforcementPolicy"),
        )
        .await
    }

    #[instrument(skip_all)]
    pub async fn iterate_users<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(User) -> Result<()>,
    {
        self.iterate_pages(Api::Graph, self.graph_url("/v1.0/users"), each)
            .await
    }

    #[instrument(skip_all)]
    pub async fn iterate_groups<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(Group) -> Result<()>,
    {
        self.iterate_pages(Api::Graph, self.graph_url("/v1.0/groups"), each)
            .await
    }

    #[instrument(skip_all)]
    pub async fn iterate_service_principals<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(ServicePrincipal) -> Result<()>,
    {
        self.iterate_pages(Api::Graph, self.graph_url("/v1.0/servicePrincipals"), each)
            .await
    }

    #[instrument(skip_all)]
    pub async fn iterate_credential_user_registration_details<F>(&self, each: F) -> Result<usize>
    where
        F: FnMut(CredentialUserRegistrationDetails) -> Result<()>,
    {
        self.iterate_pages(
            Api::Graph,
            self.graph_url("/beta/reports/credentialUserRegistrationDetails"),
            each,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::client_for;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_organization_with_domains() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/v1.0/organization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#organization",
                "value": [{
                    "id": "tenant",
                    "displayName": "Contoso",
                    "verifiedDomains": [
                        { "name": "contoso.onmicrosoft.com", "isDefault": false, "isInitial": true },
                        { "name": "contoso.com", "isDefault": true }
                    ]
                }]
            })))
            .mount(&server)
            .await;

        let org = client.fetch_organization().await.unwrap().unwrap();
        assert_eq!(org.display_name.as_deref(), Some("Contoso"));
        assert_eq!(org.verified_domains.len(), 2);
        assert_eq!(org.verified_domains[1].is_default, Some(true));
    }

    #[tokio::test]
    async fn iterates_service_principals_with_string_tags() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/v1.0/servicePrincipals"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{
                    "id": "sp-1",
                    "displayName": "deploy-bot",
                    "appId": "app-1",
                    "servicePrincipalNames": ["app-1", "https://deploy"],
                    "tags": ["WindowsAzureActiveDirectoryIntegratedApp"]
                }]
            })))
            .mount(&server)
            .await;

        let mut seen = Vec::new();
        client
            .iterate_service_principals(|sp| {
                seen.push(sp);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].tags, vec!["WindowsAzureActiveDirectoryIntegratedApp"]);
        assert_eq!(seen[0].service_principal_names.len(), 2);
    }

    #[tokio::test]
    async fn user_raw_payload_omits_absent_fields() {
        let user: super::User = serde_json::from_value(serde_json::json!({
            "id": "u-1",
            "displayName": "Ada Lovelace"
        }))
        .unwrap();

        let raw = serde_json::to_value(&user).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({ "id": "u-1", "displayName": "Ada Lovelace" })
        );
    }
}
