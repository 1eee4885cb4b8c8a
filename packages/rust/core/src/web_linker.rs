//! Azure portal deep links for ingested resources.

const PORTAL_URL: &str = "https://portal.azure.com";

/// Builds `webLink` values for a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebLinker {
    domain: Option<String>,
}

impl WebLinker {
    /// `default_domain` is the tenant's default verified domain, when known.
    pub fn new(default_domain: Option<&str>) -> Self {
        Self {
            domain: default_domain
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        }
    }

    /// `https://portal.azure.com/#@{domain}/resource{id}`, or `None` when
    /// there is no ID to link to.
    ///
    /// Without a known domain the link falls back to the portal's default
    /// directory (`#/resource{id}`).
    pub fn portal_resource_url(&self, id: Option<&str>) -> Option<String> {
        let id = id.filter(|id| !id.is_empty())?;
        Some(match &self.domain {
            Some(domain) => format!("{PORTAL_URL}/#@{domain}/resource{id}"),
            None => format!("{PORTAL_URL}/#/resource{id}"),
        })
    }
}
