//! Resource clients for Azure Resource Manager and Microsoft Graph.
//!
//! [`AzureClient`] authenticates with client credentials, follows
//! `nextLink` / `@odata.nextLink` pagination, and hands each result item to a
//! callback in source order. Each resource category adds its own typed
//! models and `iterate_*` methods in a submodule.

pub mod active_directory;
pub mod advisor;
pub mod auth;
pub mod event_grid;
pub mod key_vault;
pub mod management_groups;
pub mod monitor;
pub mod network;
pub mod redact;
pub mod resources;
pub mod storage;

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use cloudgraph_shared::{CloudGraphError, IntegrationConfig, Result};

use crate::auth::{Credentials, TokenProvider};
use crate::redact::PathRedactor;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("cloudgraph/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Tag map shared by every ARM resource.
pub type Tags = BTreeMap<String, String>;

/// A reference to another ARM resource (`{ "id": ... }`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Which API a request goes to; decides base URL and token scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    Management,
    Graph,
}

/// One page of a list response.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(default, rename = "nextLink", alias = "@odata.nextLink")]
    next_link: Option<String>,
}

/// Authenticated, paginating client for one integration instance.
pub struct AzureClient {
    http: Client,
    tokens: TokenProvider,
    redactor: PathRedactor,
    management_endpoint: String,
    graph_endpoint: String,
    directory_id: String,
    subscription_id: Option<String>,
}

impl AzureClient {
    /// Create a client for the given instance configuration.
    pub fn new(config: &IntegrationConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CloudGraphError::Network(format!("failed to build HTTP client: {e}")))?;

        let tokens = TokenProvider::new(Credentials {
            login_endpoint: config.endpoints.login.clone(),
            directory_id: config.directory_id.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        });

        Ok(Self {
            http,
            tokens,
            redactor: PathRedactor::new(&config.directory_id, config.subscription_id.clone()),
            management_endpoint: config.endpoints.management.trim_end_matches('/').to_string(),
            graph_endpoint: config.endpoints.graph.trim_end_matches('/').to_string(),
            directory_id: config.directory_id.clone(),
            subscription_id: config.subscription_id.clone().filter(|s| !s.is_empty()),
        })
    }

    /// The configured subscription, required by resource-manager list calls.
    pub fn subscription_id(&self) -> Result<&str> {
        self.subscription_id
            .as_deref()
            .ok_or_else(|| CloudGraphError::config("no subscription_id configured"))
    }

    /// Tenant the client authenticates against; also the root management group.
    pub fn directory_id(&self) -> &str {
        &self.directory_id
    }

    /// `{management}{path}`; `path` must start with `/`.
    pub(crate) fn management_url(&self, path: &str) -> String {
        format!("{}{path}", self.management_endpoint)
    }

    /// `{management}/{resource_id}{suffix}`, for requests scoped to a
    /// resource ID taken from an earlier response.
    pub(crate) fn resource_url(&self, resource_id: &str, suffix: &str) -> String {
        format!("{}/{resource_id}{suffix}", self.management_endpoint)
    }

    /// `{graph}{path}`; `path` must start with `/`.
    pub(crate) fn graph_url(&self, path: &str) -> String {
        format!("{}{path}", self.graph_endpoint)
    }

    fn scope(&self, api: Api) -> String {
        match api {
            Api::Management => format!("{}/.default", self.management_endpoint),
            Api::Graph => format!("{}/.default", self.graph_endpoint),
        }
    }

    /// GET a URL and deserialize the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, api: Api, url: &str) -> Result<T> {
        let redacted = self.redactor.redact_url(url);
        let token = self
            .tokens
            .token(&self.http, &self.redactor, &self.scope(api))
            .await?;

        debug!(url = %redacted, "GET");

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CloudGraphError::Network(format!("{redacted}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let code = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| {
                    body.pointer("/error/code")
                        .and_then(|c| c.as_str())
                        .map(str::to_string)
                });
            return Err(CloudGraphError::Network(match code {
                Some(code) => format!("{redacted}: HTTP {status} ({code})"),
                None => format!("{redacted}: HTTP {status}"),
            }));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CloudGraphError::Network(format!("{redacted}: failed to read body: {e}")))?;

        serde_json::from_str(&body).map_err(|e| CloudGraphError::parse(format!("{redacted}: {e}")))
    }

    /// Walk every page starting at `url`, calling `each` once per item.
    ///
    /// Returns the number of items visited. An error from `each` stops the
    /// iteration and is returned as-is.
    #[instrument(skip_all, fields(url = %self.redactor.redact_url(&url)))]
    pub(crate) async fn iterate_pages<T, F>(&self, api: Api, url: String, mut each: F) -> Result<usize>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> Result<()>,
    {
        let mut next = Some(url);
        let mut count = 0usize;
        let mut pages = 0usize;

        while let Some(page_url) = next.take() {
            let page: Page<T> = self.get_json(api, &page_url).await?;
            pages += 1;

            for item in page.value {
                each(item)?;
                count += 1;
            }

            next = page.next_link.filter(|link| !link.is_empty());
        }

        debug!(pages, items = count, "pagination complete");
        Ok(count)
    }
}
