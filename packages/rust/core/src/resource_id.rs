//! Helpers for pulling names out of ARM resource IDs.
//!
//! ARM is inconsistent about casing (`resourceGroups` vs `resourcegroups`),
//! so segment names are matched case-insensitively. Segment values keep the
//! casing they have in the ID.

use std::sync::LazyLock;

use regex::Regex;

static SUBSCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(/subscriptions/[^/]+)").expect("valid regex"));

static RESOURCE_GROUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(/subscriptions/[^/]+/resourceGroups/([^/]+))").expect("valid regex")
});

static EVENT_GRID_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/providers/Microsoft\.EventGrid/domains/([^/]+)").expect("valid regex")
});

static IP_CONFIGURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+/networkInterfaces/[^/]+)/ipConfigurations/[^/]+$").expect("valid regex")
});

/// `/subscriptions/{sub}` prefix of a resource ID.
pub fn subscription_path(id: &str) -> Option<&str> {
    SUBSCRIPTION_RE
        .captures(id)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Name of the resource group a resource lives in.
pub fn resource_group_name(id: &str) -> Option<&str> {
    RESOURCE_GROUP_RE
        .captures(id)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
}

/// `/subscriptions/{sub}/resourceGroups/{name}` prefix of a resource ID.
pub fn resource_group_id(id: &str) -> Option<&str> {
    RESOURCE_GROUP_RE
        .captures(id)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Name of the Event Grid domain a domain topic belongs to.
pub fn event_grid_domain_name(id: &str) -> Option<&str> {
    EVENT_GRID_DOMAIN_RE
        .captures(id)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Network interface owning an IP configuration
/// (`.../networkInterfaces/nic1/ipConfigurations/ipconfig1` → `.../networkInterfaces/nic1`).
pub fn network_interface_id(ip_configuration_id: &str) -> Option<&str> {
    IP_CONFIGURATION_RE
        .captures(ip_configuration_id)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
