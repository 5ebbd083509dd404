//! Token storage backed by one JSON file per key.
//!
//! `<dir>/<key>.json` holds the serialized token. Writes go to a temporary
//! sibling first and are renamed into place, so readers never observe a
//! half-written file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use drupal_auth_application::ports::{StorageError, TokenStorage};
use tokio::fs;
use tracing::debug;

use crate::serialization::prettify;

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// File-based token storage.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    dir: PathBuf,
}

impl FileTokenStorage {
    /// Creates storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the token files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path for `key`.
    ///
    /// Keys become file names, so only ASCII letters, digits, `-`, `_`
    /// and `.` are accepted, and a key may not start with a dot.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let content = prettify(value).map_err(|e| StorageError::Serialization(e.to_string()))?;

        fs::create_dir_all(&self.dir).await?;
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!(".{key}.{}.{seq}.tmp", std::process::id()));
        fs::write(&tmp, content.as_bytes()).await?;
        restrict_permissions(&tmp).await?;
        fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), "token file written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "token file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Token files are readable by their owner only.
#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
