//! Drupal Auth Application - Use cases and ports
//!
//! This crate holds the client logic. It depends only on the domain crate
//! and talks to the outside world through the traits in [`ports`].

pub mod auth;
pub mod csrf;
pub mod error;
pub mod ports;

#[cfg(test)]
mod test_support;

pub use auth::{AuthClient, RefreshRegistry, TokenStatus, TokenStore};
pub use csrf::{fetch_with_csrf_token, request_csrf_token};
pub use error::{ApplicationError, ApplicationResult};
