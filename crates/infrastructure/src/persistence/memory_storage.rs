//! In-memory token storage.

use std::collections::HashMap;

use async_trait::async_trait;
use drupal_auth_application::ports::{StorageError, TokenStorage};
use tokio::sync::RwLock;

/// Token storage that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
