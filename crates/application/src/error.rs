//! Application error types

use drupal_auth_domain::{AuthError, DomainError};
use thiserror::Error;

use crate::ports::{HttpClientError, StorageError};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// An HTTP request could not be sent.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpClientError),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The server answered with something unexpected.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ApplicationError {
    /// Text to show an end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(error) => error.user_message(),
            Self::Http(_) => AuthError::transport(String::new()).user_message(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
