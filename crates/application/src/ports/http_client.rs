//! HTTP client port

use async_trait::async_trait;
use drupal_auth_domain::{ApiRequest, ApiResponse, AuthError};

/// Errors raised while sending a request.
///
/// Any status code the server answers with is a response, not an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpClientError {
    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value was rejected.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The request timed out.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("DNS lookup failed for {host}: {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Error description.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Host name.
        host: String,
        /// Port.
        port: u16,
    },

    /// The connection failed for another reason (TLS, reset, ...).
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Too many redirects were followed.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Redirect limit.
        max: usize,
    },

    /// Anything else.
    #[error("HTTP error: {0}")]
    Other(String),
}

impl From<HttpClientError> for AuthError {
    fn from(error: HttpClientError) -> Self {
        Self::transport(error.to_string())
    }
}

/// Port for sending HTTP requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only if no response was received.
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError>;
}
