//! Persisted token slot with expiry tracking.
//!
//! One serialized [`Token`] lives under the configured key of a
//! [`TokenStorage`]. Every save overwrites it; the last writer wins.

use std::fmt;
use std::sync::Arc;

use drupal_auth_domain::{AuthError, Token, TokenGrant};
use tracing::debug;

use crate::ports::{Clock, TokenStorage};

/// The single stored token of one client configuration.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
    clock: Arc<dyn Clock>,
    key: String,
    /// Seconds before expiry at which the token counts as expired.
    expire_margin: i64,
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("key", &self.key)
            .field("expire_margin", &self.expire_margin)
            .finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Creates a store for `key` backed by `storage`.
    #[must_use]
    pub fn new(
        storage: Arc<dyn TokenStorage>,
        clock: Arc<dyn Clock>,
        key: impl Into<String>,
        expire_margin: i64,
    ) -> Self {
        Self {
            storage,
            clock,
            key: key.into(),
            expire_margin,
        }
    }

    /// Storage key of the token.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current time in epoch seconds.
    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.epoch_seconds()
    }

    /// Reads the stored token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backend fails or the record is corrupt.
    pub async fn load(&self) -> Result<Option<Token>, AuthError> {
        let Some(raw) = self.storage.get(&self.key).await? else {
            return Ok(None);
        };
        let token = serde_json::from_str(&raw).map_err(|e| AuthError::Storage {
            message: format!("stored token under '{}' is unreadable: {e}", self.key),
        })?;
        Ok(Some(token))
    }

    /// Stamps `grant` with the current time and overwrites the stored token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the token cannot be written.
    pub async fn save(&self, grant: TokenGrant) -> Result<Token, AuthError> {
        let token = Token::issue(grant, self.now());
        let raw = serde_json::to_string(&token).map_err(|e| AuthError::Storage {
            message: e.to_string(),
        })?;
        self.storage.set(&self.key, &raw).await?;
        debug!(
            key = %self.key,
            token = %token.preview(),
            expires_at = token.expires_at,
            "saved token"
        );
        Ok(token)
    }

    /// Deletes the stored token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backend fails.
    pub async fn clear(&self) -> Result<(), AuthError> {
        self.storage.delete(&self.key).await?;
        Ok(())
    }

    /// Whether `token` can be used as-is, accounting for the margin.
    #[must_use]
    pub fn is_usable(&self, token: &Token) -> bool {
        !token.is_expired_or_expiring(self.now(), self.expire_margin)
    }

    /// Get token status for display.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the token cannot be read.
    pub async fn status(&self) -> Result<TokenStatus, AuthError> {
        let Some(token) = self.load().await? else {
            return Ok(TokenStatus::NotAuthenticated);
        };
        let now = self.now();
        let seconds_remaining = token.seconds_until_expiry(now);
        let status = if token.is_expired_or_expiring(now, 0) {
            TokenStatus::Expired {
                can_refresh: token.can_refresh(),
            }
        } else if token.is_expired_or_expiring(now, self.expire_margin) {
            TokenStatus::Expiring {
                seconds_remaining,
                can_refresh: token.can_refresh(),
            }
        } else {
            TokenStatus::Valid { seconds_remaining }
        };
        Ok(status)
    }
}

/// Status of the stored token for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No token is stored.
    NotAuthenticated,
    /// Token is valid and outside the expiry margin.
    Valid {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Token is still valid but inside the expiry margin.
    Expiring {
        /// Seconds until expiry.
        seconds_remaining: i64,
        /// Whether the token can be refreshed.
        can_refresh: bool,
    },
    /// Token has expired.
    Expired {
        /// Whether the token can be refreshed.
        can_refresh: bool,
    },
}

impl TokenStatus {
    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Not logged in".to_string(),
            Self::Valid { seconds_remaining } => {
                if *seconds_remaining > 3600 {
                    format!("Logged in, token valid for {} hours", seconds_remaining / 3600)
                } else if *seconds_remaining > 60 {
                    format!("Logged in, token valid for {} minutes", seconds_remaining / 60)
                } else {
                    format!("Logged in, token valid for {seconds_remaining} seconds")
                }
            }
            Self::Expiring {
                seconds_remaining,
                can_refresh,
            } => {
                let refresh_hint = if *can_refresh {
                    " (will refresh on next use)"
                } else {
                    ""
                };
                format!("Token expiring in {seconds_remaining} seconds{refresh_hint}")
            }
            Self::Expired { can_refresh } => {
                if *can_refresh {
                    "Token expired (can refresh)".to_string()
                } else {
                    "Token expired, log in again".to_string()
                }
            }
        }
    }
}
