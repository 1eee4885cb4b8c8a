//! Diagnostic settings shared by resource steps that ingest them.
//!
//! There is no monitor step of its own: a resource step calls
//! [`ingest_diagnostic_settings`] for each resource it stores and declares
//! the setting schemas in its own output.

pub mod constants;
pub mod converters;

use tracing::debug;

use cloudgraph_client::AzureClient;
use cloudgraph_shared::{RelationshipSchema, Result};

use crate::job_state::{JobState, LinkOutcome};
use crate::web_linker::WebLinker;

pub use self::constants::*;
use self::converters::*;

/// The `HAS` schemas linking a resource type to its settings.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticLinks {
    pub has_log_setting: RelationshipSchema,
    pub has_metric_setting: RelationshipSchema,
}

/// Store the diagnostic settings of the resource at `resource_key`, which is
/// its ARM ID.
///
/// Each log and metric entry becomes an entity linked from the resource, and
/// to the storage account it archives to when that account is in the state.
/// Returns the number of setting entities stored.
pub(crate) async fn ingest_diagnostic_settings(
    client: &AzureClient,
    state: &mut JobState,
    linker: &WebLinker,
    resource_key: &str,
    links: &DiagnosticLinks,
) -> Result<usize> {
    let settings = client.fetch_diagnostic_settings(resource_key).await?;

    let mut stored = 0;
    for setting in &settings {
        let entries = setting
            .properties
            .logs
            .iter()
            .map(|entry| (SettingKind::Log, entry))
            .chain(setting.properties.metrics.iter().map(|entry| (SettingKind::Metric, entry)));

        for (kind, entry) in entries {
            let (has, uses) = match kind {
                SettingKind::Log => (&links.has_log_setting, &DIAGNOSTIC_LOG_SETTING_USES_STORAGE_ACCOUNT),
                SettingKind::Metric => {
                    (&links.has_metric_setting, &DIAGNOSTIC_METRIC_SETTING_USES_STORAGE_ACCOUNT)
                }
            };

            let key = state
                .add_entity(create_diagnostic_setting_entity(linker, setting, kind, entry)?)?
                .key
                .clone();
            state.add_relationship(has.create(resource_key, &key))?;
            link_storage_account(
                state,
                &key,
                setting.properties.storage_account_id.as_deref(),
                uses,
            )?;
            stored += 1;
        }
    }

    debug!(resource = resource_key, settings = settings.len(), stored, "diagnostic settings");
    Ok(stored)
}

/// Storage account IDs are matched case-insensitively against stored keys.
fn link_storage_account(
    state: &mut JobState,
    setting_key: &str,
    storage_account_id: Option<&str>,
    uses: &RelationshipSchema,
) -> Result<LinkOutcome> {
    let Some(id) = storage_account_id else {
        return Ok(LinkOutcome::TargetNotFound);
    };
    let to_key = state
        .find_entity_ignore_case(id)
        .map_or_else(|| id.to_string(), |account| account.key.clone());
    state.link(uses.create(setting_key, &to_key))
}
