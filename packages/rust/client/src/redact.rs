//! Redaction rules for anything about a request that ends up in logs.
//!
//! Tenant and subscription identifiers are replaced with placeholders, and
//! token responses have their `access_token` blanked.

use serde_json::Value;
use url::Url;

/// Placeholder for redacted secrets.
pub const REDACTED: &str = "[REDACTED]";

/// Replaces tenant/subscription identifiers in request paths.
#[derive(Debug, Clone)]
pub struct PathRedactor {
    directory_id: String,
    subscription_id: Option<String>,
}

impl PathRedactor {
    pub fn new(directory_id: impl Into<String>, subscription_id: Option<String>) -> Self {
        Self {
            directory_id: directory_id.into(),
            subscription_id: subscription_id.filter(|s| !s.is_empty()),
        }
    }

    /// Normalize a request path.
    ///
    /// The directory ID always becomes `directory-id`. The subscription ID
    /// becomes `subscription-id` unless the path was built from an exact
    /// resource ID returned by an earlier response (it then starts with
    /// `//subscriptions`).
    pub fn normalize_path(&self, pathname: &str) -> String {
        let mut path = if self.directory_id.is_empty() {
            pathname.to_string()
        } else {
            pathname.replace(&self.directory_id, "directory-id")
        };

        if should_replace_subscription_id(&path) {
            if let Some(subscription_id) = &self.subscription_id {
                path = path.replace(subscription_id.as_str(), "subscription-id");
            }
        }

        path
    }

    /// Normalized path of a full URL, with the query string kept.
    pub fn redact_url(&self, url: &str) -> String {
        match Url::parse(url) {
            Ok(parsed) => {
                let path = self.normalize_path(parsed.path());
                match parsed.query() {
                    Some(query) => format!("{path}?{query}"),
                    None => path,
                }
            }
            Err(_) => self.normalize_path(url),
        }
    }
}

/// Whether a path's subscription ID came from configuration (and should be
/// replaced) rather than from a resource ID in an earlier response.
pub fn should_replace_subscription_id(pathname: &str) -> bool {
    !pathname.starts_with("//subscriptions")
}

/// Blank the `access_token` of a token endpoint response body.
///
/// Non-JSON bodies and bodies without a token are returned unchanged.
pub fn redact_token_response(body: &str) -> String {
    let Ok(mut json) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    match json.get_mut("access_token") {
        Some(token) => {
            *token = Value::String(REDACTED.to_string());
            json.to_string()
        }
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTORY: &str = "bcd90474-9b62-4040-9d7b-8af257b1427d";
    const SUBSCRIPTION: &str = "40474ebe-55a2-4071-8fa8-b610acdd8e56";

    fn redactor() -> PathRedactor {
        PathRedactor::new(DIRECTORY, Some(SUBSCRIPTION.to_string()))
    }

    #[test]
    fn replaces_configured_subscription_id() {
        let path = format!("/subscriptions/{SUBSCRIPTION}/resourcegroups");
        assert_eq!(
            redactor().normalize_path(&path),
            "/subscriptions/subscription-id/resourcegroups"
        );
    }

    #[test]
    fn keeps_subscription_id_in_exact_resource_paths() {
        let path = format!(
            "//subscriptions/{SUBSCRIPTION}/resourceGroups/j1dev/providers/Microsoft.EventGrid/topics/t1"
        );
        assert_eq!(redactor().normalize_path(&path), path);
    }

    #[test]
    fn replaces_directory_id() {
        let path = format!("/{DIRECTORY}/oauth2/v2.0/token");
        assert_eq!(redactor().normalize_path(&path), "/directory-id/oauth2/v2.0/token");
    }

    #[test]
    fn redacts_full_url_and_keeps_query() {
        let url = format!(
            "https://management.azure.com/subscriptions/{SUBSCRIPTION}/resourcegroups?api-version=2021-04-01"
        );
        assert_eq!(
            redactor().redact_url(&url),
            "/subscriptions/subscription-id/resourcegroups?api-version=2021-04-01"
        );
    }

    #[test]
    fn redacts_access_token() {
        let body = r#"{"token_type":"Bearer","expires_in":3599,"access_token":"eyJ0eXAi"}"#;
        let redacted = redact_token_response(body);
        assert!(redacted.contains(REDACTED));
        assert!(!redacted.contains("eyJ0eXAi"));
        assert!(redacted.contains("Bearer"));

        assert_eq!(redact_token_response("not json"), "not json");
        assert_eq!(redact_token_response(r#"{"a":1}"#), r#"{"a":1}"#);
    }
}
