//! Storage configuration loader.
//!
//! Reads a TOML file holding either a `[storage]` table or top-level storage
//! keys and deserializes it into [`StorageConfig`]. Unlike optional settings,
//! a storage backend cannot run without a connection URL, so a missing or
//! malformed file is an error rather than a fallback to defaults.

use std::path::Path;

use sqlkv_types::config::StorageConfig;
use sqlkv_types::error::StorageError;

/// Environment variable overriding `data_url`.
pub const DATA_URL_ENV: &str = "SQLKV_DATA_URL";

/// Load storage configuration from `path`, then apply environment overrides.
pub async fn load_storage_config(path: &Path) -> Result<StorageConfig, StorageError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|err| {
        StorageError::Configuration(format!("failed to read {}: {err}", path.display()))
    })?;

    let config = parse_storage_config(&content)
        .map_err(|err| StorageError::Configuration(format!("{}: {err}", path.display())))?;
    tracing::debug!(path = %path.display(), "loaded storage config");

    Ok(apply_data_url_override(config, std::env::var(DATA_URL_ENV).ok()))
}

/// Parse storage settings from TOML text.
pub fn parse_storage_config(content: &str) -> Result<StorageConfig, StorageError> {
    let mut table: toml::Table = toml::from_str(content)
        .map_err(|e| StorageError::Configuration(format!("invalid TOML: {e}")))?;

    let section = match table.remove("storage") {
        Some(storage) => storage,
        None => toml::Value::Table(table),
    };

    section
        .try_into()
        .map_err(|e| StorageError::Configuration(format!("invalid storage settings: {e}")))
}

/// Replace `data_url` with `url` when one is given and non-blank.
pub fn apply_data_url_override(mut config: StorageConfig, url: Option<String>) -> StorageConfig {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
        config.data_url = Some(url);
    }
    config
}
