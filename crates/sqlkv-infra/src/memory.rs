//! In-memory storage plugin.
//!
//! Same contract as the SQL provider without a database, for host tests and
//! throwaway bots. Handles opened on the same namespace share one map; values
//! are kept in their encoded form so the codec and size limits still apply.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use sqlkv_core::codec;
use sqlkv_core::storage::{Storage, StoragePlugin};
use sqlkv_types::error::StorageError;
use sqlkv_types::storage::{Namespace, key_fits, validate_key};

type EntryMap = DashMap<String, String>;

/// Storage plugin keeping every namespace in process memory.
#[derive(Default)]
pub struct MemoryStorageProvider {
    namespaces: DashMap<String, Arc<EntryMap>>,
}

impl MemoryStorageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespaces opened so far, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl StoragePlugin for MemoryStorageProvider {
    type Handle = MemoryStorageHandle;

    async fn open(&self, namespace: &str) -> Result<MemoryStorageHandle, StorageError> {
        let namespace = Namespace::new(namespace)?;
        let entries = self
            .namespaces
            .entry(namespace.as_str().to_string())
            .or_default()
            .clone();
        Ok(MemoryStorageHandle {
            namespace,
            entries,
            closed: AtomicBool::new(false),
        })
    }
}

/// Handle onto one in-memory namespace.
pub struct MemoryStorageHandle {
    namespace: Namespace,
    entries: Arc<EntryMap>,
    closed: AtomicBool,
}

impl MemoryStorageHandle {
    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

impl Storage for MemoryStorageHandle {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    async fn get(&self, key: &str) -> Result<serde_json::Value, StorageError> {
        self.ensure_open()?;
        if !key_fits(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let encoded = self
            .entries
            .get(key)
            .map(|v| v.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        codec::decode(&encoded)
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        self.ensure_open()?;
        validate_key(key)?;
        let encoded = codec::encode(value)?;
        self.entries.insert(key.to_string(), encoded);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.ensure_open()?;
        if !key_fits(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        self.entries
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn len(&self) -> Result<u64, StorageError> {
        self.ensure_open()?;
        Ok(self.entries.len() as u64)
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.ensure_open()?;
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
