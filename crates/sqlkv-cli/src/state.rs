//! Application state: resolved storage configuration and the provider.

use std::path::Path;

use anyhow::Context;
use sqlkv_infra::config::{apply_data_url_override, load_storage_config};
use sqlkv_infra::sql::SqlStorageProvider;
use sqlkv_infra::sql::pool::{default_data_dir, default_database_url};
use sqlkv_types::config::StorageConfig;

/// Shared state for one CLI invocation.
pub struct AppState {
    pub provider: SqlStorageProvider,
}

impl AppState {
    /// Resolve configuration and connect to the database.
    pub async fn init(
        config_path: Option<&Path>,
        data_url: Option<String>,
        debug_sql: bool,
    ) -> anyhow::Result<Self> {
        let config = resolve_config(config_path, data_url, debug_sql).await?;
        let provider = SqlStorageProvider::new(&config)
            .await
            .context("failed to open storage")?;
        Ok(Self { provider })
    }

    pub async fn shutdown(&self) {
        self.provider.close().await;
    }
}

/// Merge the config file, the `--data-url` flag and the default location.
///
/// Precedence: `--data-url` / `SQLKV_DATA_URL`, then the config file, then
/// `~/.sqlkv/sqlkv.db` (whose directory is created on demand).
pub async fn resolve_config(
    config_path: Option<&Path>,
    data_url: Option<String>,
    debug_sql: bool,
) -> anyhow::Result<StorageConfig> {
    let config = match config_path {
        Some(path) => load_storage_config(path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => StorageConfig::default(),
    };

    let mut config = apply_data_url_override(config, data_url);
    if config.data_url.is_none() {
        let data_dir = default_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        config.data_url = Some(default_database_url());
        tracing::debug!(data_dir = %data_dir.display(), "using default database");
    }
    config.debug_sql |= debug_sql;

    Ok(config)
}
