//! Outbound request types

use serde::{Deserialize, Serialize};

use super::{Headers, HttpMethod};

/// JSON:API media type.
pub const JSON_API: &str = "application/vnd.api+json";

/// Everything about a request except where it goes, like the options
/// argument of a browser `fetch`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// HTTP method
    pub method: HttpMethod,
    /// Caller-supplied headers
    #[serde(default)]
    pub headers: Headers,
    /// Request body
    #[serde(default)]
    pub body: Option<String>,
}

impl RequestOptions {
    /// Options for a request with the given method and nothing else.
    #[must_use]
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// GET with `Accept: application/vnd.api+json`.
    #[must_use]
    pub fn json_api_get() -> Self {
        Self::new(HttpMethod::Get).with_header("Accept", JSON_API)
    }

    /// A JSON:API write with both `Accept` and `Content-Type` set.
    #[must_use]
    pub fn json_api_write(method: HttpMethod, body: impl Into<String>) -> Self {
        Self::new(method)
            .with_header("Accept", JSON_API)
            .with_header("Content-Type", JSON_API)
            .with_body(body)
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Pairs the options with a target URL.
    #[must_use]
    pub fn into_request(self, url: impl Into<String>) -> ApiRequest {
        ApiRequest {
            url: url.into(),
            method: self.method,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// A fully specified HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Absolute URL
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Headers
    pub headers: Headers,
    /// Body
    pub body: Option<String>,
}

impl ApiRequest {
    /// Body parsed as `application/x-www-form-urlencoded` pairs.
    ///
    /// Returns an empty list when there is no body or it is not form data.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.body
            .as_deref()
            .and_then(|body| serde_urlencoded::from_str(body).ok())
            .unwrap_or_default()
    }
}
