//! OAuth2 token types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::AuthError;

/// Success body of the token endpoint, before an issue time is stamped on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// The access token string
    pub access_token: String,
    /// Refresh token for obtaining new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    /// Token type (usually "Bearer")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Any other fields the server sent along
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TokenGrant {
    /// Creates a grant with no extra fields.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_in,
            token_type: Some("Bearer".to_string()),
            extra: BTreeMap::new(),
        }
    }
}

/// Error body of the token endpoint.
///
/// Drupal's `simple_oauth` sends `error` plus a description, and newer
/// versions add `message` and `hint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthErrorBody {
    /// OAuth error code, e.g. `invalid_grant`
    pub error: String,
    /// Human readable description
    #[serde(default)]
    pub error_description: Option<String>,
    /// Alternate human readable message
    #[serde(default)]
    pub message: Option<String>,
    /// Extra hint from the server
    #[serde(default)]
    pub hint: Option<String>,
}

impl OAuthErrorBody {
    /// Best message to show a user: description, then message, then the code.
    #[must_use]
    pub fn display_message(&self) -> String {
        self.error_description
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or(&self.error)
            .to_string()
    }
}

/// An OAuth2 credential set as persisted by the client.
///
/// `issued_at` and `expires_at` are epoch seconds; `expires_at` is always
/// `issued_at + expires_in`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The access token string
    pub access_token: String,
    /// Refresh token for obtaining new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    /// Token type (usually "Bearer")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// When this token was saved
    pub issued_at: i64,
    /// When the access token stops being valid
    pub expires_at: i64,
    /// Fields from the grant that the client does not interpret
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Keys `Token` serializes itself; a grant echoing them must not shadow them.
const RESERVED_FIELDS: [&str; 6] = [
    "access_token",
    "refresh_token",
    "expires_in",
    "token_type",
    "issued_at",
    "expires_at",
];

impl Token {
    /// Stamps a grant with its issue time.
    #[must_use]
    pub fn issue(grant: TokenGrant, issued_at: i64) -> Self {
        let mut extra = grant.extra;
        for key in RESERVED_FIELDS {
            extra.remove(key);
        }
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_in: grant.expires_in,
            token_type: grant.token_type,
            issued_at,
            expires_at: issued_at.saturating_add(grant.expires_in),
            extra,
        }
    }

    /// Check if the token is expired or will expire within `margin` seconds.
    #[must_use]
    pub const fn is_expired_or_expiring(&self, now: i64, margin: i64) -> bool {
        self.expires_at.saturating_sub(margin) <= now
    }

    /// Check if the token can be refreshed.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Seconds until expiry, negative once expired.
    #[must_use]
    pub const fn seconds_until_expiry(&self, now: i64) -> i64 {
        self.expires_at.saturating_sub(now)
    }

    /// Returns the Authorization header value.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Short form of the access token that is safe to log.
    #[must_use]
    pub fn preview(&self) -> String {
        preview(&self.access_token)
    }
}

/// First 8 chars of a secret followed by an ellipsis.
#[must_use]
pub fn preview(secret: &str) -> String {
    if secret.len() > 12 {
        let cut = secret
            .char_indices()
            .nth(8)
            .map_or(secret.len(), |(idx, _)| idx);
        format!("{}...", &secret[..cut])
    } else {
        "***".to_string()
    }
}

/// Result of a refresh-grant exchange the server answered.
///
/// A refusal is an expected outcome of refreshing, not an error: the stored
/// token is left alone and the caller decides what to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A new token was issued and persisted.
    Refreshed(Token),
    /// The server refused the refresh token.
    Rejected {
        /// OAuth error code
        code: String,
        /// Server message
        message: String,
    },
}

impl RefreshOutcome {
    /// The new token, if the refresh succeeded.
    #[must_use]
    pub fn token(self) -> Option<Token> {
        match self {
            Self::Refreshed(token) => Some(token),
            Self::Rejected { .. } => None,
        }
    }

    /// Turns a refusal into [`AuthError::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns the server's refusal as an error.
    pub fn into_result(self) -> Result<Token, AuthError> {
        match self {
            Self::Refreshed(token) => Ok(token),
            Self::Rejected { code, message } => Err(AuthError::Rejected { code, message }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_issue_computes_expires_at() {
        let grant = TokenGrant::new("access123", Some("refresh456".to_string()), 300);
        let token = Token::issue(grant, 1_700_000_000);

        assert_eq!(token.issued_at, 1_700_000_000);
        assert_eq!(token.expires_at, 1_700_000_300);
        assert!(token.can_refresh());
        assert_eq!(token.authorization_header(), "Bearer access123");
    }

    #[test]
    fn test_expiry_respects_margin() {
        let token = Token::issue(TokenGrant::new("a", None, 100), 1000);

        assert!(!token.is_expired_or_expiring(1050, 0));
        assert!(token.is_expired_or_expiring(1050, 50));
        assert!(token.is_expired_or_expiring(1100, 0));
        assert_eq!(token.seconds_until_expiry(1040), 60);
    }

    #[test]
    fn test_grant_keeps_unknown_fields() {
        let json = r#"{
            "token_type": "Bearer",
            "expires_in": 300,
            "access_token": "abc",
            "refresh_token": "def",
            "scope": "oauth"
        }"#;
        let grant: TokenGrant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.extra.get("scope"), Some(&Value::from("oauth")));

        let token = Token::issue(grant, 10);
        let stored = serde_json::to_value(&token).unwrap();
        assert_eq!(stored["scope"], "oauth");
        assert_eq!(stored["expires_at"], 310);

        let back: Token = serde_json::from_value(stored).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn test_grant_cannot_shadow_stamped_fields() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_in":300,"expires_at":999,"issued_at":1}"#,
        )
        .unwrap();
        let token = Token::issue(grant, 10);
        assert!(token.extra.is_empty());

        let stored = serde_json::to_string(&token).unwrap();
        let back: Token = serde_json::from_str(&stored).unwrap();
        assert_eq!(back.issued_at, 10);
        assert_eq!(back.expires_at, 310);
        assert_eq!(back, token);
    }

    #[test]
    fn test_error_body_message_fallback() {
        let body: OAuthErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","message":"The user credentials were incorrect."}"#,
        )
        .unwrap();
        assert_eq!(body.display_message(), "The user credentials were incorrect.");

        let bare: OAuthErrorBody = serde_json::from_str(r#"{"error":"invalid_client"}"#).unwrap();
        assert_eq!(bare.display_message(), "invalid_client");
    }

    #[test]
    fn test_refresh_outcome_into_result() {
        let rejected = RefreshOutcome::Rejected {
            code: "invalid_grant".to_string(),
            message: "expired".to_string(),
        };
        assert_eq!(rejected.clone().token(), None);
        assert_eq!(
            rejected.into_result().unwrap_err().code(),
            Some("invalid_grant")
        );
    }

    #[test]
    fn test_preview_hides_short_secrets() {
        assert_eq!(preview("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(preview("short"), "***");
    }
}
