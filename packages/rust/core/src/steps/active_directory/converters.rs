use cloudgraph_client::active_directory::{
    CredentialUserRegistrationDetails, Group, Organization, SecurityDefaultsPolicy,
    ServicePrincipal, User,
};
use cloudgraph_shared::{
    Entity, IntegrationInstance, Relationship, Result, generate_entity_key,
};

use super::constants::*;
use crate::steps::{epoch_millis, resource_key};

pub fn create_account_entity(instance: &IntegrationInstance) -> Result<Entity> {
    Ok(Entity::new(generate_entity_key(&instance.id)?, &ACCOUNT_ENTITY)
        .with("name", &instance.name)
        .with("displayName", &instance.name))
}

/// Account entity enriched with the tenant's organization record.
///
/// `name` is the organization's name while `displayName` stays the instance
/// name. The default domain is the verified domain flagged `isDefault`.
pub fn create_account_entity_with_organization(
    instance: &IntegrationInstance,
    organization: &Organization,
    security_defaults: Option<&SecurityDefaultsPolicy>,
) -> Result<Entity> {
    let mut default_domain = None;
    let verified_domains: Vec<&str> = organization
        .verified_domains
        .iter()
        .filter_map(|domain| {
            let name = domain.name.as_deref()?;
            if domain.is_default == Some(true) {
                default_domain = Some(name);
            }
            Some(name)
        })
        .collect();

    let entity = Entity::new(generate_entity_key(&instance.id)?, &ACCOUNT_ENTITY)
        .with("id", &organization.id)
        .with("name", &organization.display_name)
        .with("displayName", &instance.name)
        .with("organizationName", &organization.display_name)
        .with("defaultDomain", default_domain)
        .with("verifiedDomains", verified_domains)
        .with("securityDefaultsEnabled", security_defaults.and_then(|p| p.is_enabled));

    Ok(match security_defaults {
        Some(policy) => entity.with_raw_data("identitySecurityDefaultsEnforcementPolicy", policy),
        None => entity,
    })
}

pub fn create_user_entity(
    user: &User,
    registration: Option<&CredentialUserRegistrationDetails>,
) -> Result<Entity> {
    let display_name = user.display_name.as_deref();
    let first_name = user
        .given_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .or_else(|| display_name.and_then(|n| n.split(' ').next()));
    let last_name = user
        .surname
        .as_deref()
        .filter(|n| !n.is_empty())
        .or_else(|| display_name.and_then(|n| n.split(' ').next_back()));

    let entity = Entity::new(resource_key(user.id.as_deref(), &USER_ENTITY)?, &USER_ENTITY)
        .with("id", &user.id)
        .with("name", display_name)
        .with("displayName", display_name)
        .with("givenName", &user.given_name)
        .with("surname", &user.surname)
        .with("mail", &user.mail)
        .with("userPrincipalName", &user.user_principal_name)
        .with("jobTitle", &user.job_title)
        .with("officeLocation", &user.office_location)
        .with("mobilePhone", &user.mobile_phone)
        .with("preferredLanguage", &user.preferred_language)
        .with("active", user.account_enabled)
        .with("accountEnabled", user.account_enabled)
        .with("email", &user.mail)
        .with("firstName", first_name)
        .with("lastName", last_name)
        .with("username", &user.user_principal_name)
        .with("isMfaRegistered", registration.and_then(|r| r.is_mfa_registered))
        .with_raw_data("default", user);

    Ok(match registration {
        Some(details) => entity.with_raw_data("registrationDetails", details),
        None => entity,
    })
}

pub fn create_group_entity(group: &Group) -> Result<Entity> {
    Ok(
        Entity::new(resource_key(group.id.as_deref(), &GROUP_ENTITY)?, &GROUP_ENTITY)
            .with("id", &group.id)
            .with("name", &group.display_name)
            .with("displayName", &group.display_name)
            .with("description", &group.description)
            .with("mail", &group.mail)
            .with("email", &group.mail)
            .with("mailEnabled", group.mail_enabled)
            .with("securityEnabled", group.security_enabled)
            .with("createdOn", epoch_millis(group.created_date_time.as_deref()))
            .with("deletedOn", epoch_millis(group.deleted_date_time.as_deref()))
            .with("renewedOn", epoch_millis(group.renewed_date_time.as_deref()))
            .with_raw_data("default", group),
    )
}

/// Graph tags on service principals are bare strings; each becomes a
/// `tag.<value>: true` property and the list is kept as `tags`.
pub fn create_service_principal_entity(sp: &ServicePrincipal) -> Result<Entity> {
    let mut entity = Entity::new(
        resource_key(sp.id.as_deref(), &SERVICE_PRINCIPAL_ENTITY)?,
        &SERVICE_PRINCIPAL_ENTITY,
    )
    .with("id", &sp.id)
    .with("function", ["service-account"])
    .with("userType", "service")
    .with("category", ["infrastructure"])
    .with("name", &sp.display_name)
    .with("displayName", &sp.display_name)
    .with("appDisplayName", &sp.app_display_name)
    .with("appId", &sp.app_id)
    .with("servicePrincipalType", &sp.service_principal_type)
    .with("servicePrincipalNames", &sp.service_principal_names)
    .with("accountEnabled", sp.account_enabled)
    .with_raw_data("default", sp);

    if !sp.tags.is_empty() {
        for tag in &sp.tags {
            entity.set(&format!("tag.{tag}"), true);
        }
        entity.set("tags", &sp.tags);
    }
    Ok(entity)
}

pub fn create_account_user_relationship(account: &Entity, user: &Entity) -> Relationship {
    ACCOUNT_HAS_USER.create(&account.key, &user.key)
}

pub fn create_account_group_relationship(account: &Entity, group: &Entity) -> Relationship {
    ACCOUNT_HAS_GROUP.create(&account.key, &group.key)
}

pub fn create_account_service_principal_relationship(
    account: &Entity,
    service_principal: &Entity,
) -> Relationship {
    ACCOUNT_HAS_SERVICE_PRINCIPAL.create(&account.key, &service_principal.key)
}
