//! Client configuration

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DomainError, DomainResult};

/// Path of the OAuth token endpoint, relative to the site base URL.
pub const TOKEN_PATH: &str = "/oauth/token";

/// Path that returns a CSRF token for the current session.
pub const SESSION_TOKEN_PATH: &str = "/session/token";

/// Path that echoes the identity behind the current token.
pub const DEBUG_PATH: &str = "/oauth/debug?_format=json";

/// Settings for one OAuth client of one Drupal site.
///
/// Missing fields take the tutorial defaults when deserialized.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the Drupal site, without a trailing slash.
    pub base_url: String,
    /// Storage key under which the token is saved.
    pub token_name: String,
    /// OAuth client ID, from the consumer entity in Drupal.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Drupal role tied to this OAuth client.
    pub scope: String,
    /// Seconds before expiry at which a token is treated as expired.
    pub expire_margin: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://react-tutorials-2.ddev.site".to_string(),
            token_name: "drupal-oauth-token".to_string(),
            client_id: "cb0379f2-7c9f-48bb-8973-f0f11b6064d5".to_string(),
            client_secret: "app".to_string(),
            scope: "oauth".to_string(),
            expire_margin: 0,
        }
    }
}

// Hand-written so the secret never ends up in logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token_name", &self.token_name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("expire_margin", &self.expire_margin)
            .finish()
    }
}

impl ClientConfig {
    /// Defaults pointed at another site.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Sets the base URL. A trailing slash is dropped.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the storage key.
    #[must_use]
    pub fn with_token_name(mut self, token_name: impl Into<String>) -> Self {
        self.token_name = token_name.into();
        self
    }

    /// Sets the OAuth client credentials.
    #[must_use]
    pub fn with_client(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.client_secret = client_secret.into();
        self
    }

    /// Sets the scope requested on login.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the expiry safety margin in seconds.
    #[must_use]
    pub const fn with_expire_margin(mut self, seconds: i64) -> Self {
        self.expire_margin = seconds;
        self
    }

    /// Joins a site-relative path onto the base URL.
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Full URL of the token endpoint.
    #[must_use]
    pub fn token_url(&self) -> String {
        self.resolve(TOKEN_PATH)
    }

    /// Checks that the base URL is an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUrl` otherwise.
    pub fn validate(&self) -> DomainResult<()> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| DomainError::InvalidUrl(format!("{e}: {}", self.base_url)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(DomainError::InvalidUrl(format!(
                "unsupported scheme '{other}': {}",
                self.base_url
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.token_name, "drupal-oauth-token");
        assert_eq!(config.scope, "oauth");
        assert_eq!(config.expire_margin, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_strips_trailing_slash() {
        let config = ClientConfig::new("http://localhost:8080/");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.token_url(), "http://localhost:8080/oauth/token");
        assert_eq!(
            config.resolve("/jsonapi/node/article"),
            "http://localhost:8080/jsonapi/node/article"
        );
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"http://drupal.test","scope":"editor"}"#).unwrap();
        assert_eq!(config.base_url, "http://drupal.test");
        assert_eq!(config.scope, "editor");
        assert_eq!(config.client_secret, "app");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ClientConfig::default().with_client("id", "super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(ClientConfig::new("not a url").validate().is_err());
        assert!(ClientConfig::new("ftp://drupal.test").validate().is_err());
    }
}
