//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A required header name is invalid.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    /// A header line could not be split into name and value.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
