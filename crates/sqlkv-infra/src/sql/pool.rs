//! Connection pool setup.
//!
//! One `AnyPool` is shared by every handle of a provider. Server databases
//! get a regular pool with connection recycling and pre-ping. SQLite gets the
//! static pool policy: a single connection that is never recycled, so an
//! in-memory database lives as long as the pool and every task sees it.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlkv_types::config::StorageConfig;
use sqlkv_types::error::StorageError;
use sqlx::ConnectOptions;
use sqlx::AnyPool;
use sqlx::any::{AnyConnectOptions, AnyPoolOptions};

use super::dialect::{self, Dialect};

/// Pool knobs derived from a `StorageConfig` and the target dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    pub test_before_acquire: bool,
}

impl PoolSettings {
    pub fn for_dialect(dialect: Dialect, config: &StorageConfig) -> Self {
        if dialect.is_embedded() {
            return Self {
                max_connections: 1,
                min_connections: 1,
                max_lifetime: None,
                idle_timeout: None,
                test_before_acquire: config.connection_ping,
            };
        }

        let max_lifetime =
            (config.connection_recycle > 0).then(|| Duration::from_secs(config.connection_recycle));
        Self {
            max_connections: config.max_connections.max(1),
            min_connections: 0,
            max_lifetime,
            idle_timeout: Some(Duration::from_secs(600)),
            test_before_acquire: config.connection_ping,
        }
    }

    fn pool_options(&self) -> AnyPoolOptions {
        AnyPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .max_lifetime(self.max_lifetime)
            .idle_timeout(self.idle_timeout)
            .test_before_acquire(self.test_before_acquire)
    }
}

/// Shared connection pool plus the dialect it speaks.
#[derive(Clone)]
pub struct DatabasePool {
    pub pool: AnyPool,
    pub dialect: Dialect,
}

impl DatabasePool {
    /// Connect using the URL and pool settings in `config`.
    ///
    /// Fails with `Configuration` when the URL is missing or unsupported and
    /// with `Database` when the database cannot be reached.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let (dialect, url) = dialect::parse_url(config.connection_url()?)?;
        sqlx::any::install_default_drivers();

        let options = connect_options(&url, config.debug_sql)?;

        let settings = PoolSettings::for_dialect(dialect, config);
        tracing::debug!(
            ?dialect,
            max_connections = settings.max_connections,
            recycle_secs = ?settings.max_lifetime.map(|d| d.as_secs()),
            ping = settings.test_before_acquire,
            "connecting storage pool"
        );

        let pool = settings
            .pool_options()
            .connect_with(options)
            .await
            .map_err(db_err)?;

        Ok(Self { pool, dialect })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Parse `url` into connect options. Statements are only logged (on the
/// `sqlx::query` target) when `debug_sql` is set.
pub(crate) fn connect_options(url: &str, debug_sql: bool) -> Result<AnyConnectOptions, StorageError> {
    let options = AnyConnectOptions::from_str(url)
        .map_err(|e| StorageError::Configuration(format!("invalid connection URL: {e}")))?;
    if debug_sql {
        Ok(options)
    } else {
        Ok(options.disable_statement_logging())
    }
}

pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    StorageError::Database(e.to_string())
}

/// Data directory from `SQLKV_DATA_DIR`, falling back to `~/.sqlkv`.
pub fn default_data_dir() -> PathBuf {
    std::env::var_os("SQLKV_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".sqlkv")
        })
}

/// Default database URL: `sqlkv.db` inside [`default_data_dir`].
pub fn default_database_url() -> String {
    format!(
        "sqlite:///{}?mode=rwc",
        default_data_dir().join("sqlkv.db").display()
    )
}
