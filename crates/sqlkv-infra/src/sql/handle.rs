//! SQL-backed namespace handle.
//!
//! Implements `Storage` from `sqlkv-core`. Every operation runs in its own
//! transaction: commit on success, rollback and propagate on failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlkv_core::codec;
use sqlkv_core::storage::Storage;
use sqlkv_types::error::StorageError;
use sqlkv_types::storage::{Namespace, key_fits, validate_key};
use sqlx::{AnyConnection, AnyPool};
use sqlx::{Any, Row, Transaction};

use super::pool::db_err;
use super::schema::TableSchema;

/// Handle onto one namespace table.
pub struct SqlStorageHandle {
    pool: AnyPool,
    schema: Arc<TableSchema>,
    closed: AtomicBool,
}

impl SqlStorageHandle {
    pub(crate) fn new(pool: AnyPool, schema: Arc<TableSchema>) -> Self {
        Self {
            pool,
            schema,
            closed: AtomicBool::new(false),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Any>, StorageError> {
        self.ensure_open()?;
        self.pool.begin().await.map_err(db_err)
    }

    /// Commit on success, roll back on failure.
    async fn finish<T>(
        &self,
        tx: Transaction<'static, Any>,
        op: &'static str,
        result: Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        match result {
            Ok(value) => {
                tx.commit().await.map_err(db_err)?;
                Ok(value)
            }
            Err(err) => {
                if !err.is_not_found() {
                    tracing::debug!(
                        namespace = %self.schema.namespace(),
                        op,
                        error = %err,
                        "rolling back storage transaction"
                    );
                }
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(
                        namespace = %self.schema.namespace(),
                        op,
                        error = %rollback_err,
                        "storage rollback failed"
                    );
                }
                Err(err)
            }
        }
    }

    async fn fetch_value(
        &self,
        conn: &mut AnyConnection,
        key: &str,
    ) -> Result<serde_json::Value, StorageError> {
        let row = sqlx::query(&self.schema.select_value_sql)
            .bind(key)
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => {
                let encoded: String = row.try_get("value").map_err(db_err)?;
                codec::decode(&encoded)
            }
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    async fn write_value(
        &self,
        conn: &mut AnyConnection,
        key: &str,
        encoded: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(&self.schema.upsert_sql)
            .bind(key)
            .bind(encoded)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_existing(&self, conn: &mut AnyConnection, key: &str) -> Result<(), StorageError> {
        let (matches,): (i64,) = sqlx::query_as(&self.schema.count_key_sql)
            .bind(key)
            .fetch_one(&mut *conn)
            .await
            .map_err(db_err)?;
        if matches == 0 {
            return Err(StorageError::NotFound(key.to_string()));
        }

        sqlx::query(&self.schema.delete_sql)
            .bind(key)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn count_rows(&self, conn: &mut AnyConnection) -> Result<u64, StorageError> {
        let (count,): (i64,) = sqlx::query_as(&self.schema.count_sql)
            .fetch_one(&mut *conn)
            .await
            .map_err(db_err)?;
        u64::try_from(count)
            .map_err(|_| StorageError::Database(format!("negative row count {count}")))
    }

    async fn fetch_keys(&self, conn: &mut AnyConnection) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query(&self.schema.keys_sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(db_err)?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            let key: String = row.try_get("key").map_err(db_err)?;
            keys.push(key);
        }
        Ok(keys)
    }
}

impl Storage for SqlStorageHandle {
    fn namespace(&self) -> &Namespace {
        self.schema.namespace()
    }

    async fn get(&self, key: &str) -> Result<serde_json::Value, StorageError> {
        self.ensure_open()?;
        if !key_fits(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let mut tx = self.begin().await?;
        let result = self.fetch_value(&mut tx, key).await;
        self.finish(tx, "get", result).await
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        validate_key(key)?;
        let encoded = codec::encode(value)?;

        let mut tx = self.begin().await?;
        let result = self.write_value(&mut tx, key, &encoded).await;
        self.finish(tx, "set", result).await?;

        tracing::trace!(namespace = %self.schema.namespace(), key, bytes = encoded.len(), "stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.ensure_open()?;
        if !key_fits(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let mut tx = self.begin().await?;
        let result = self.delete_existing(&mut tx, key).await;
        self.finish(tx, "remove", result).await
    }

    async fn len(&self) -> Result<u64, StorageError> {
        let mut tx = self.begin().await?;
        let result = self.count_rows(&mut tx).await;
        self.finish(tx, "len", result).await
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut tx = self.begin().await?;
        let result = self.fetch_keys(&mut tx).await;
        self.finish(tx, "keys", result).await
    }

    async fn close(&self) -> Result<(), StorageError> {
        // Every operation commits on its own, so there is never pending work.
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(namespace = %self.schema.namespace(), "storage handle closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlkv_core::storage::StoragePlugin;
    use sqlkv_types::config::StorageConfig;
    use sqlkv_types::storage::{MAX_KEY_BYTES, MAX_VALUE_BYTES};

    use crate::sql::provider::SqlStorageProvider;

    async fn test_provider() -> SqlStorageProvider {
        SqlStorageProvider::new(&StorageConfig::with_url("sqlite::memory:"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let provider = test_provider().await;
        let store = provider.open("settings").await.unwrap();

        let value = json!({"theme": "dark", "font_size": 14, "tags": ["a", "b"]});
        store.set("settings", &value).await.unwrap();

        assert_eq!(store.get("settings").await.unwrap(), value);
    }

    #[tokio::test]
    async fn test_get_nonexistent_is_not_found() {
        let provider = test_provider().await;
        let store = provider.open("settings").await.unwrap();

        let err = store.get("missing").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(ref key) if key == "missing"));
    }

    #[tokio::test]
    async fn test_set_upserts() {
        let provider = test_provider().await;
        let store = provider.open("counters").await.unwrap();

        store.set("counter", &json!(1)).await.unwrap();
        store.set("counter", &json!(2)).await.unwrap();

        assert_eq!(store.get("counter").await.unwrap(), json!(2));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let provider = test_provider().await;
        let store = provider.open("temp").await.unwrap();

        store.set("temp", &json!("value")).await.unwrap();
        store.remove("temp").await.unwrap();

        assert!(store.get("temp").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_remove_nonexistent_is_not_found() {
        let provider = test_provider().await;
        let store = provider.open("temp").await.unwrap();
        store.set("kept", &json!(true)).await.unwrap();

        let err = store.remove("nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_twice() {
        let provider = test_provider().await;
        let store = provider.open("temp").await.unwrap();

        store.set("once", &json!(1)).await.unwrap();
        store.remove("once").await.unwrap();
        assert!(store.remove("once").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_count_matches_distinct_sets() {
        let provider = test_provider().await;
        let store = provider.open("many").await.unwrap();

        for i in 0..25 {
            store.set(&format!("key-{i}"), &json!(i)).await.unwrap();
        }
        assert_eq!(store.len().await.unwrap(), 25);
        assert!(!store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_keys() {
        let provider = test_provider().await;
        let store = provider.open("keys").await.unwrap();

        store.set("beta", &json!("b")).await.unwrap();
        store.set("alpha", &json!("a")).await.unwrap();
        store.set("gamma", &json!("g")).await.unwrap();

        let mut keys = store.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["alpha", "beta", "gamma"]);

        // Re-invoking restarts the enumeration.
        assert_eq!(store.keys().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_keys_empty() {
        let provider = test_provider().await;
        let store = provider.open("empty").await.unwrap();

        assert!(store.keys().await.unwrap().is_empty());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_json_value_types() {
        let provider = test_provider().await;
        let store = provider.open("types").await.unwrap();

        let cases = [
            ("string", json!("hello")),
            ("number", json!(42)),
            ("float", json!(2.5)),
            ("bool", json!(true)),
            ("null", json!(null)),
            ("array", json!([1, "two", 3])),
            ("nested", json!({"a": {"b": {"c": true}}})),
        ];

        for (key, value) in &cases {
            store.set(key, value).await.unwrap();
        }
        for (key, value) in &cases {
            assert_eq!(&store.get(key).await.unwrap(), value, "key {key}");
        }
    }

    #[tokio::test]
    async fn test_oversized_value_rejected_without_write() {
        let provider = test_provider().await;
        let store = provider.open("big").await.unwrap();

        let err = store
            .set("blob", &json!("x".repeat(MAX_VALUE_BYTES)))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ValueTooLarge { .. }));
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oversized_key_rejected_on_set() {
        let provider = test_provider().await;
        let store = provider.open("big").await.unwrap();

        let key = "k".repeat(MAX_KEY_BYTES + 1);
        assert!(matches!(
            store.set(&key, &json!(1)).await,
            Err(StorageError::InvalidKey(_))
        ));
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oversized_key_is_absent_on_read_and_delete() {
        let provider = test_provider().await;
        let store = provider.open("prefs").await.unwrap();
        store.set("color", &json!("blue")).await.unwrap();

        let key = "k".repeat(MAX_KEY_BYTES + 1);
        let err = store.get(&key).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(ref k) if *k == key));
        assert!(!store.contains(&key).await.unwrap());
        assert!(store.remove(&key).await.unwrap_err().is_not_found());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_closed_handle_rejects_operations() {
        let provider = test_provider().await;
        let store = provider.open("prefs").await.unwrap();
        store.set("color", &json!("blue")).await.unwrap();

        store.close().await.unwrap();
        store.close().await.unwrap();

        assert!(matches!(store.get("color").await, Err(StorageError::Closed)));
        assert!(matches!(
            store.set("color", &json!("red")).await,
            Err(StorageError::Closed)
        ));
        assert!(matches!(store.len().await, Err(StorageError::Closed)));

        // Other handles on the same namespace keep working.
        let other = provider.open("prefs").await.unwrap();
        assert_eq!(other.get("color").await.unwrap(), json!("blue"));
    }

    #[tokio::test]
    async fn test_stored_garbage_surfaces_as_serialization_error() {
        let provider = test_provider().await;
        let store = provider.open("raw").await.unwrap();

        let insert = format!(
            "INSERT INTO {} (\"key\", \"value\") VALUES ('broken', '{{not json')",
            store.schema().table()
        );
        sqlx::query(&insert)
            .execute(&provider.pool().pool)
            .await
            .unwrap();

        let err = store.get("broken").await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_prefs_scenario() {
        let provider = test_provider().await;
        let store = provider.open("prefs").await.unwrap();

        store.set("color", &json!("blue")).await.unwrap();
        assert_eq!(store.get("color").await.unwrap(), json!("blue"));
        assert_eq!(store.len().await.unwrap(), 1);

        store.remove("color").await.unwrap();
        assert!(store.get("color").await.unwrap_err().is_not_found());
        assert_eq!(store.len().await.unwrap(), 0);
    }
}
