//! SQL storage provider.
//!
//! Implements `StoragePlugin` from `sqlkv-core`. Owns the connection pool and
//! a namespace -> `TableSchema` map; the backing table of a namespace is
//! created the first time it is opened.

use std::sync::Arc;

use dashmap::DashMap;
use sqlkv_core::storage::StoragePlugin;
use sqlkv_types::config::StorageConfig;
use sqlkv_types::error::StorageError;
use sqlkv_types::storage::Namespace;

use super::dialect::Dialect;
use super::handle::SqlStorageHandle;
use super::pool::{DatabasePool, db_err};
use super::schema::TableSchema;

/// Process-wide factory for SQL-backed namespace handles.
pub struct SqlStorageProvider {
    pool: DatabasePool,
    schemas: DashMap<String, Arc<TableSchema>>,
}

impl SqlStorageProvider {
    /// Connect to the database described by `config`.
    pub async fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let pool = DatabasePool::connect(config).await?;
        tracing::info!(dialect = ?pool.dialect, "sql storage provider ready");
        Ok(Self::from_pool(pool))
    }

    /// Build a provider on top of an existing pool.
    pub fn from_pool(pool: DatabasePool) -> Self {
        Self {
            pool,
            schemas: DashMap::new(),
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.pool.dialect
    }

    /// Namespaces opened through this provider, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Close the pool. Handles opened earlier fail with `Database` afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("sql storage provider closed");
    }

    /// Return the schema for `namespace`, creating its table on first use.
    async fn ensure_schema(&self, namespace: Namespace) -> Result<Arc<TableSchema>, StorageError> {
        if let Some(schema) = self.schemas.get(namespace.as_str()).map(|s| Arc::clone(&s)) {
            return Ok(schema);
        }

        let schema = Arc::new(TableSchema::new(namespace, self.pool.dialect));
        // IF NOT EXISTS makes a concurrent first open of the same namespace harmless.
        sqlx::query(&schema.create_sql)
            .execute(&self.pool.pool)
            .await
            .map_err(db_err)?;
        tracing::debug!(namespace = %schema.namespace(), table = schema.table(), "namespace table ensured");

        let schema = self
            .schemas
            .entry(schema.namespace().as_str().to_string())
            .or_insert(schema)
            .clone();
        Ok(schema)
    }
}

impl StoragePlugin for SqlStorageProvider {
    type Handle = SqlStorageHandle;

    async fn open(&self, namespace: &str) -> Result<SqlStorageHandle, StorageError> {
        let namespace = Namespace::new(namespace)?;
        self.pool.dialect.check_namespace(&namespace)?;
        let schema = self.ensure_schema(namespace).await?;
        Ok(SqlStorageHandle::new(self.pool.pool.clone(), schema))
    }
}
