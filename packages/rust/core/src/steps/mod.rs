//! Step handlers, builders and schema constants, one module per resource
//! category.

pub mod active_directory;
pub mod advisor;
pub mod event_grid;
pub mod key_vault;
pub mod management_groups;
pub mod monitor;
pub mod network;
pub mod resources;
pub mod storage;

use serde::Deserialize;

use cloudgraph_client::Tags;
use cloudgraph_shared::{CloudGraphError, Entity, EntitySchema, Result, generate_entity_key};

use crate::job_state::JobState;
use crate::resource_id::resource_group_name;
use crate::web_linker::WebLinker;

use self::active_directory::constants::ACCOUNT_ENTITY_TYPE;

/// Projection of a stored resource group.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceGroupRef {
    pub id: String,
    pub name: String,
}

/// Projection of any stored parent resource (domain, topic, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct ParentResourceRef {
    #[serde(rename = "_key")]
    pub key: String,
    pub id: String,
    pub name: String,
}

/// The account entity stored by the account step.
pub(crate) fn account_entity(state: &JobState) -> Result<Entity> {
    state
        .get_data::<Entity>(ACCOUNT_ENTITY_TYPE)?
        .ok_or_else(|| CloudGraphError::validation("account entity not found in job state"))
}

/// Web linker for the tenant's default domain.
pub(crate) fn web_linker(state: &JobState) -> Result<WebLinker> {
    let account = account_entity(state)?;
    Ok(WebLinker::new(account.str_property("defaultDomain")))
}

/// Key of a resource, from its ARM ID.
pub(crate) fn resource_key(id: Option<&str>, schema: &EntitySchema) -> Result<String> {
    let id = id.ok_or_else(|| {
        CloudGraphError::validation(format!("{} without an id", schema.resource_name))
    })?;
    generate_entity_key(id)
}

/// Epoch milliseconds of an RFC 3339 timestamp; unparseable input is absent.
pub(crate) fn epoch_millis(timestamp: Option<&str>) -> Option<i64> {
    timestamp
        .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.timestamp_millis())
}

/// Fields every ARM resource entity carries: `id`, `name`, `displayName`,
/// `type`, `region`, `resourceGroup`, `webLink` and `tag.*`.
pub(crate) struct ArmResource<'a> {
    pub id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub resource_type: Option<&'a str>,
    pub location: Option<&'a str>,
    pub tags: Option<&'a Tags>,
}

impl ArmResource<'_> {
    /// `lifted` tags are also copied to top-level properties.
    pub(crate) fn entity(
        &self,
        schema: &EntitySchema,
        linker: &WebLinker,
        lifted: &[&str],
    ) -> Result<Entity> {
        let key = resource_key(self.id, schema)?;
        Ok(Entity::new(key, schema)
            .with("id", self.id)
            .with("name", self.name)
            .with("displayName", self.name)
            .with("type", self.resource_type)
            .with("region", self.location)
            .with("resourceGroup", self.id.and_then(resource_group_name))
            .with("webLink", linker.portal_resource_url(self.id))
            .with_tags(self.tags, lifted))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use cloudgraph_client::AzureClient;
    use cloudgraph_shared::{
        EndpointsConfig, Entity, IntegrationConfig, IntegrationInstance,
    };
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::active_directory::constants::{ACCOUNT_ENTITY, ACCOUNT_ENTITY_TYPE};
    use crate::job_state::JobState;
    use crate::registry::{StepContext, StepHandler};

    pub const SUBSCRIPTION: &str = "40474ebe-55a2-4071-8fa8-b610acdd8e56";
    pub const DIRECTORY: &str = "bcd90474-9b62-4040-9d7b-8af257b1427d";
    pub const ACCOUNT_KEY: &str = "azure_account_id";

    pub fn integration_config(endpoint: &str) -> IntegrationConfig {
        IntegrationConfig {
            instance: IntegrationInstance {
                id: ACCOUNT_KEY.into(),
                name: "Azure Test".into(),
            },
            client_id: "clientId".into(),
            client_secret: "clientSecret".into(),
            directory_id: DIRECTORY.into(),
            subscription_id: Some(SUBSCRIPTION.into()),
            ingest_active_directory: true,
            endpoints: EndpointsConfig {
                login: endpoint.into(),
                management: endpoint.into(),
                graph: endpoint.into(),
            },
        }
    }

    /// A client that is never expected to make a request.
    pub fn offline_client(config: &IntegrationConfig) -> AzureClient {
        AzureClient::new(config).expect("build client")
    }

    /// Mount the token endpoint and build a client against `server`.
    pub async fn mock_client(server: &MockServer) -> (IntegrationConfig, AzureClient) {
        Mock::given(method("POST"))
            .and(path(format!("/{DIRECTORY}/oauth2/v2.0/token")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "test-token"
            })))
            .mount(server)
            .await;

        let config = integration_config(&server.uri());
        let client = AzureClient::new(&config).expect("build client");
        (config, client)
    }

    /// Job State holding the account entity, as the account step leaves it.
    pub fn state_with_account() -> JobState {
        let mut state = JobState::new();
        let account = Entity::new(ACCOUNT_KEY, &ACCOUNT_ENTITY)
            .with("defaultDomain", "www.fake-domain.com");
        state.set_data(ACCOUNT_ENTITY_TYPE, &account).expect("set account");
        state.add_entity(account).expect("add account");
        state
    }

    /// Run one handler against the given state.
    pub async fn run_handler(
        handler: StepHandler,
        config: &IntegrationConfig,
        client: &AzureClient,
        state: &mut JobState,
    ) -> cloudgraph_shared::Result<()> {
        let mut ctx = StepContext {
            config,
            client,
            job_state: state,
        };
        handler(&mut ctx).await
    }
}
