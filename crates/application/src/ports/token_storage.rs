//! Token storage port
//!
//! A key-value slot for the serialized token, the way a browser client
//! would use `localStorage`.

use async_trait::async_trait;
use drupal_auth_domain::AuthError;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The key cannot be used by this backend.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

impl From<StorageError> for AuthError {
    fn from(error: StorageError) -> Self {
        Self::Storage {
            message: error.to_string(),
        }
    }
}

/// Key-value store holding serialized tokens.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Reads the value under `key`, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
