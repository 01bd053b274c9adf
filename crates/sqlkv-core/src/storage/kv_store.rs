//! Key-value storage traits.
//!
//! A host bot opens one [`Storage`] handle per namespace through a
//! [`StoragePlugin`]. Implementations live in sqlkv-infra.

use std::future::Future;

use sqlkv_types::error::StorageError;
use sqlkv_types::storage::Namespace;

/// Handle onto one namespace of key/value entries.
///
/// Every mutating call runs as its own unit of work: it either commits fully
/// or leaves the namespace untouched. Once [`Storage::close`] has been called
/// all further calls fail with [`StorageError::Closed`].
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait Storage: Send + Sync {
    /// Namespace this handle is bound to.
    fn namespace(&self) -> &Namespace;

    /// Get a value by key. Fails with `NotFound` if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<serde_json::Value, StorageError>> + Send;

    /// Set a value for a key (upsert).
    fn set(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete a key. Fails with `NotFound` if the key does not exist.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Number of entries in the namespace.
    fn len(&self) -> impl Future<Output = Result<u64, StorageError>> + Send;

    /// All keys in the namespace. Order is not part of the contract.
    fn keys(&self) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;

    /// Release the handle. Other handles on the same namespace are unaffected.
    fn close(&self) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn is_empty(&self) -> impl Future<Output = Result<bool, StorageError>> + Send {
        async move { Ok(self.len().await? == 0) }
    }

    /// Whether the key exists. Errors other than `NotFound` propagate.
    fn contains(&self, key: &str) -> impl Future<Output = Result<bool, StorageError>> + Send {
        async move {
            match self.get(key).await {
                Ok(_) => Ok(true),
                Err(err) if err.is_not_found() => Ok(false),
                Err(err) => Err(err),
            }
        }
    }
}

/// Factory handing out [`Storage`] handles, one per `open` call.
pub trait StoragePlugin: Send + Sync {
    type Handle: Storage;

    /// Open (creating on first use) the named namespace.
    ///
    /// Idempotent: opening the same namespace twice never fails and returns
    /// handles that do not share transactional state.
    fn open(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<Self::Handle, StorageError>> + Send;
}
