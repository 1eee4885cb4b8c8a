//! Azure Active Directory (Microsoft Graph) steps.

pub mod constants;
pub mod converters;

use std::collections::HashMap;

use tracing::{info, warn};

use cloudgraph_shared::Result;

use crate::registry::{BoxFuture, Step, StepContext};
use crate::steps::account_entity;

pub use self::constants::{
    ACCOUNT_ENTITY_TYPE, STEP_AD_ACCOUNT, STEP_AD_GROUPS, STEP_AD_SERVICE_PRINCIPALS,
    STEP_AD_USERS,
};
use self::constants::*;
use self::converters::*;

/// Steps that read the directory rather than resource manager.
pub fn is_directory_step(id: &str) -> bool {
    id.starts_with("ad-")
}

fn fetch_account<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let instance = &ctx.config.instance;

        let account = match client.fetch_organization().await {
            Ok(Some(organization)) => {
                let security_defaults = match client.fetch_security_defaults_policy().await {
                    Ok(policy) => Some(policy),
                    Err(e) => {
                        warn!(error = %e, "security defaults policy unavailable");
                        None
                    }
                };
                create_account_entity_with_organization(
                    instance,
                    &organization,
                    security_defaults.as_ref(),
                )?
            }
            Ok(None) => {
                warn!("no organization returned, using instance details for the account");
                create_account_entity(instance)?
            }
            Err(e) => {
                warn!(error = %e, "organization unavailable, using instance details for the account");
                create_account_entity(instance)?
            }
        };

        ctx.job_state.set_data(ACCOUNT_ENTITY_TYPE, &account)?;
        ctx.job_state.add_entity(account)?;
        Ok(())
    })
}

fn fetch_users<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let account = account_entity(state)?;

        let mut registrations = HashMap::new();
        let registration_result = client
            .iterate_credential_user_registration_details(|details| {
                if let Some(id) = details.id.clone() {
                    registrations.insert(id, details);
                }
                Ok(())
            })
            .await;
        if let Err(e) = registration_result {
            warn!(error = %e, "MFA registration details unavailable, continuing without them");
        }

        let count = client
            .iterate_users(|user| {
                let details = user.id.as_deref().and_then(|id| registrations.get(id));
                let entity = state.add_entity(create_user_entity(&user, details)?)?;
                let relationship = create_account_user_relationship(&account, entity);
                state.add_relationship(relationship)
            })
            .await?;

        info!(count, "users ingested");
        Ok(())
    })
}

fn fetch_groups<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let account = account_entity(state)?;

        let count = client
            .iterate_groups(|group| {
                let entity = state.add_entity(create_group_entity(&group)?)?;
                let relationship = create_account_group_relationship(&account, entity);
                state.add_relationship(relationship)
            })
            .await?;

        info!(count, "groups ingested");
        Ok(())
    })
}

fn fetch_service_principals<'a>(ctx: &'a mut StepContext<'_>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let client = ctx.client;
        let state = &mut *ctx.job_state;
        let account = account_entity(state)?;

        let count = client
            .iterate_service_principals(|sp| {
                let entity = state.add_entity(create_service_principal_entity(&sp)?)?;
                let relationship = create_account_service_principal_relationship(&account, entity);
                state.add_relationship(relationship)
            })
            .await?;

        info!(count, "service principals ingested");
        Ok(())
    })
}

pub fn steps() -> Vec<Step> {
    vec![
        Step {
            id: STEP_AD_ACCOUNT,
            name: "Active Directory Info",
            entities: &[ACCOUNT_ENTITY],
            relationships: &[],
            depends_on: &[],
            handler: fetch_account,
        },
        Step {
            id: STEP_AD_USERS,
            name: "Active Directory Users",
            entities: &[USER_ENTITY],
            relationships: &[ACCOUNT_HAS_USER],
            depends_on: &[STEP_AD_ACCOUNT],
            handler: fetch_users,
        },
        Step {
            id: STEP_AD_GROUPS,
            name: "Active Directory Groups",
            entities: &[GROUP_ENTITY],
            relationships: &[ACCOUNT_HAS_GROUP],
            depends_on: &[STEP_AD_ACCOUNT],
            handler: fetch_groups,
        },
        Step {
            id: STEP_AD_SERVICE_PRINCIPALS,
            name: "Active Directory Service Principals",
            entities: &[SERVICE_PRINCIPAL_ENTITY],
            relationships: &[ACCOUNT_HAS_SERVICE_PRINCIPAL],
            depends_on: &[STEP_AD_ACCOUNT],
            handler: fetch_service_principals,
        },
    ]
}
