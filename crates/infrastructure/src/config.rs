//! Client configuration loading.
//!
//! Settings come from [`ClientConfig::default`], then an optional JSON file,
//! then `DRUPAL_*` environment variables. Later sources win field by field.

use std::path::{Path, PathBuf};

use drupal_auth_domain::{ClientConfig, DomainError};
use thiserror::Error;
use tracing::debug;

use crate::serialization::{SerializationError, from_json_bytes};

/// Overrides `base_url`.
pub const ENV_BASE_URL: &str = "DRUPAL_BASE_URL";
/// Overrides `token_name`.
pub const ENV_TOKEN_NAME: &str = "DRUPAL_TOKEN_NAME";
/// Overrides `client_id`.
pub const ENV_CLIENT_ID: &str = "DRUPAL_CLIENT_ID";
/// Overrides `client_secret`.
pub const ENV_CLIENT_SECRET: &str = "DRUPAL_CLIENT_SECRET";
/// Overrides `scope`.
pub const ENV_SCOPE: &str = "DRUPAL_SCOPE";
/// Overrides `expire_margin`, in seconds.
pub const ENV_EXPIRE_MARGIN: &str = "DRUPAL_EXPIRE_MARGIN";

/// Errors raised while assembling a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid JSON for a client configuration.
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// Path of the file.
        path: PathBuf,
        /// Parser error.
        source: SerializationError,
    },

    /// An environment variable holds an unusable value.
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },

    /// The assembled configuration failed validation.
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

/// Loads the configuration from `path` (if any) and the process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, or the
/// result does not validate.
pub async fn load_client_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    load_client_config_with(path, |name| std::env::var(name).ok()).await
}

/// Like [`load_client_config`] but reads variables through `env`.
///
/// # Errors
///
/// See [`load_client_config`].
pub async fn load_client_config_with<E>(
    path: Option<&Path>,
    env: E,
) -> Result<ClientConfig, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config_file(path).await?,
        None => ClientConfig::default(),
    };
    apply_env_overrides(&mut config, env)?;
    config.validate()?;
    debug!(?config, "client configuration loaded");
    Ok(config)
}

async fn read_config_file(path: &Path) -> Result<ClientConfig, ConfigError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ClientConfig = from_json_bytes(&bytes).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let base_url = config.base_url.clone();
    Ok(config.with_base_url(base_url))
}

/// Applies every `DRUPAL_*` variable that is set and non-empty.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnv`] if `DRUPAL_EXPIRE_MARGIN` is not an integer.
pub fn apply_env_overrides<E>(config: &mut ClientConfig, env: E) -> Result<(), ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let get = |name: &str| env(name).filter(|value| !value.trim().is_empty());

    if let Some(base_url) = get(ENV_BASE_URL) {
        *config = std::mem::take(config).with_base_url(base_url);
    }
    if let Some(token_name) = get(ENV_TOKEN_NAME) {
        *config = std::mem::take(config).with_token_name(token_name);
    }
    if let Some(client_id) = get(ENV_CLIENT_ID) {
        config.client_id = client_id;
    }
    if let Some(client_secret) = get(ENV_CLIENT_SECRET) {
        config.client_secret = client_secret;
    }
    if let Some(scope) = get(ENV_SCOPE) {
        *config = std::mem::take(config).with_scope(scope);
    }
    if let Some(margin) = get(ENV_EXPIRE_MARGIN) {
        let seconds = margin.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            name: ENV_EXPIRE_MARGIN,
            value: margin,
        })?;
        *config = std::mem::take(config).with_expire_margin(seconds);
    }
    Ok(())
}

/// Default directory for token files: `<data dir>/drupal-auth`.
#[must_use]
pub fn default_token_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("drupal-auth"))
}
