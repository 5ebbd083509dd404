//! Authentication errors

use thiserror::Error;

use super::OAuthErrorBody;

/// Message shown when the identity endpoint cannot be reached.
const CONNECTIVITY_MESSAGE: &str =
    "Could not reach the site. Check your network connection and try again.";

/// Authentication errors.
///
/// Refusals reported by the token endpoint are kept apart from failures to
/// reach it, so callers can tell "wrong password" from "network unreachable".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token endpoint refused the request (bad credentials, invalid grant).
    #[error("OAuth request rejected ({code}): {message}")]
    Rejected {
        /// OAuth error code, e.g. `invalid_grant`.
        code: String,
        /// Server-provided description.
        message: String,
    },

    /// The request to the token endpoint could not complete.
    #[error("transport error: {message}")]
    Transport {
        /// Error description.
        message: String,
    },

    /// No token is stored.
    #[error("no token stored")]
    NoToken,

    /// Token expired and no refresh token available.
    #[error("token expired and no refresh token available")]
    TokenExpiredNoRefresh,

    /// The token endpoint answered with something that is neither a token nor an OAuth error.
    #[error("invalid token endpoint response: {message}")]
    InvalidResponse {
        /// Error description.
        message: String,
    },

    /// Reading or writing the stored token failed.
    #[error("token storage error: {message}")]
    Storage {
        /// Error description.
        message: String,
    },
}

impl AuthError {
    /// Builds a rejection from the endpoint's error body.
    #[must_use]
    pub fn rejected(body: &OAuthErrorBody) -> Self {
        Self::Rejected {
            code: body.error.clone(),
            message: body.display_message(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// The OAuth error code, for rejections.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns true if the server could not be reached.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns true if logging in again is the fix.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::NoToken | Self::TokenExpiredNoRefresh | Self::Rejected { .. }
        )
    }

    /// Text to show an end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Transport { .. } | Self::InvalidResponse { .. } => {
                CONNECTIVITY_MESSAGE.to_string()
            }
            Self::NoToken | Self::TokenExpiredNoRefresh => "You are not logged in.".to_string(),
            Self::Storage { .. } => "Could not access the saved session.".to_string(),
        }
    }
}
