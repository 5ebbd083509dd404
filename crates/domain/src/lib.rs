//! Drupal Auth Domain - Core types
//!
//! This crate defines the domain model for the Drupal OAuth client:
//! tokens, configuration, errors and the request/response records that
//! cross the HTTP port. All types here are pure Rust with no I/O.

pub mod auth;
pub mod config;
pub mod error;
pub mod request;
pub mod response;

pub use auth::{AuthError, OAuthErrorBody, RefreshOutcome, Token, TokenGrant};
pub use config::{ClientConfig, DEBUG_PATH, SESSION_TOKEN_PATH, TOKEN_PATH};
pub use error::{DomainError, DomainResult};
pub use request::{
    AUTHORIZATION, ApiRequest, CSRF_TOKEN, Header, Headers, HttpMethod, JSON_API, RequestOptions,
};
pub use response::{ApiResponse, StatusCode};
