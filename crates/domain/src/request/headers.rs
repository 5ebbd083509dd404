//! Request headers

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{DomainError, DomainResult};

/// Header carrying the bearer token.
pub const AUTHORIZATION: &str = "Authorization";

/// Header carrying the session CSRF token.
pub const CSRF_TOKEN: &str = "X-CSRF-Token";

/// A single HTTP header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name, as given by the caller
    pub name: String,
    /// Header value
    pub value: String,
}

impl Header {
    /// Creates a header.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl FromStr for Header {
    type Err = DomainError;

    /// Parses `Name: value`.
    fn from_str(s: &str) -> DomainResult<Self> {
        let (name, value) = s
            .split_once(':')
            .ok_or_else(|| DomainError::InvalidHeader(s.to_string()))?;
        let name = name.trim();
        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DomainError::InvalidHeaderName(name.to_string()));
        }
        Ok(Self::new(name, value.trim()))
    }
}

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(Vec<Header>);

impl Headers {
    /// Creates an empty header list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// First value for `name`, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Whether a header named `name` is present, ignoring case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Adds a header, keeping existing ones with the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Header::new(name, value));
    }

    /// Replaces every header named `name` with a single one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let header = Header::new(name, value);
        self.0.retain(|h| !h.name.eq_ignore_ascii_case(&header.name));
        self.0.push(header);
    }

    /// Iterates over headers in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.0.iter()
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
