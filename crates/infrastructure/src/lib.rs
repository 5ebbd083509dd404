//! Drupal Auth Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{ReqwestHttpClient, SystemClock};
pub use config::{ConfigError, default_token_dir, load_client_config, load_client_config_with};
pub use persistence::{FileTokenStorage, MemoryTokenStorage};
pub use serialization::{SerializationError, from_json_bytes, prettify, to_json_pretty};
