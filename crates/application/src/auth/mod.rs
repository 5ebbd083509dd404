//! Authentication against a Drupal `simple_oauth` token endpoint.
//!
//! This module provides:
//! - The [`AuthClient`] (login, logout, token retrieval and authenticated fetch)
//! - The persisted token slot with expiry tracking
//! - Coalescing of concurrent refreshes

mod client;
mod registry;
mod token_store;

pub use client::AuthClient;
pub use registry::{PendingRefresh, RefreshRegistry, RefreshResult};
pub use token_store::{TokenStatus, TokenStore};
