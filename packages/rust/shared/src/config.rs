//! Application configuration for cloudgraph.
//!
//! User config lives at `~/.cloudgraph/cloudgraph.toml`.
//! CLI flags override config file values, which override defaults.
//! The client secret is never stored in the file; only the name of the
//! environment variable holding it is.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CloudGraphError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "cloudgraph.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".cloudgraph";

// ---------------------------------------------------------------------------
// Config structs (matching cloudgraph.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Integration instance identity.
    #[serde(default)]
    pub instance: InstanceConfig,

    /// Azure credentials and scope.
    #[serde(default)]
    pub azure: AzureConfig,

    /// Which step groups to run.
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// API endpoints (overridable for sovereign clouds and tests).
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// `[instance]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Stable identifier of this integration instance (seeds the account key).
    #[serde(default = "default_instance_id")]
    pub id: String,

    /// Human-readable instance name.
    #[serde(default = "default_instance_name")]
    pub name: String,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            id: default_instance_id(),
            name: default_instance_name(),
        }
    }
}

fn default_instance_id() -> String {
    "cloudgraph-local".into()
}
fn default_instance_name() -> String {
    "Azure".into()
}

/// `[azure]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// App registration (client) ID.
    #[serde(default)]
    pub client_id: String,

    /// Tenant (directory) ID.
    #[serde(default)]
    pub directory_id: String,

    /// Subscription to ingest resource-manager data from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    /// Name of the env var holding the client secret.
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            directory_id: String::new(),
            subscription_id: None,
            client_secret_env: default_client_secret_env(),
        }
    }
}

fn default_client_secret_env() -> String {
    "AZURE_CLIENT_SECRET".into()
}

/// `[ingestion]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Whether to run the Active Directory user/group/service principal steps.
    #[serde(default = "default_true")]
    pub ingest_active_directory: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            ingest_active_directory: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[endpoints]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// OAuth2 authority.
    #[serde(default = "default_login")]
    pub login: String,

    /// Azure Resource Manager.
    #[serde(default = "default_management")]
    pub management: String,

    /// Microsoft Graph.
    #[serde(default = "default_graph")]
    pub graph: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            login: default_login(),
            management: default_management(),
            graph: default_graph(),
        }
    }
}

fn default_login() -> String {
    "https://login.microsoftonline.com".into()
}
fn default_management() -> String {
    "https://management.azure.com".into()
}
fn default_graph() -> String {
    "https://graph.microsoft.com".into()
}

// ---------------------------------------------------------------------------
// Integration config (runtime, merged from config + env + CLI flags)
// ---------------------------------------------------------------------------

/// The integration instance a run is executed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationInstance {
    pub id: String,
    pub name: String,
}

/// Runtime configuration for one ingestion run.
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub instance: IntegrationInstance,
    pub client_id: String,
    pub client_secret: String,
    pub directory_id: String,
    pub subscription_id: Option<String>,
    pub ingest_active_directory: bool,
    pub endpoints: EndpointsConfig,
}

impl IntegrationConfig {
    /// Merge the file config with the resolved client secret.
    pub fn from_app_config(config: &AppConfig, client_secret: impl Into<String>) -> Self {
        Self {
            instance: IntegrationInstance {
                id: config.instance.id.clone(),
                name: config.instance.name.clone(),
            },
            client_id: config.azure.client_id.clone(),
            client_secret: client_secret.into(),
            directory_id: config.azure.directory_id.clone(),
            subscription_id: config.azure.subscription_id.clone(),
            ingest_active_directory: config.ingestion.ingest_active_directory,
            endpoints: config.endpoints.clone(),
        }
    }

    /// The subscription ID, or a config error if none is set.
    pub fn require_subscription_id(&self) -> Result<&str> {
        self.subscription_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CloudGraphError::config("no subscription_id configured"))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.cloudgraph/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CloudGraphError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.cloudgraph/cloudgraph.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CloudGraphError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CloudGraphError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CloudGraphError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CloudGraphError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CloudGraphError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the credentials are complete and resolve the client secret
/// from its environment variable.
pub fn validate_credentials(config: &AppConfig) -> Result<String> {
    if config.azure.client_id.is_empty() {
        return Err(CloudGraphError::config("azure.client_id is not set"));
    }
    if config.azure.directory_id.is_empty() {
        return Err(CloudGraphError::config("azure.directory_id is not set"));
    }

    let var_name = &config.azure.client_secret_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(CloudGraphError::config(format!(
            "Azure client secret not found. Set the {var_name} environment variable."
        ))),
    }
}
