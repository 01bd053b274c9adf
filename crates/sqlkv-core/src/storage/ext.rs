//! Typed access on top of any [`Storage`].

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlkv_types::error::StorageError;

use super::kv_store::Storage;
use crate::codec;

/// Read and write concrete serde types instead of raw JSON values.
pub trait StorageExt: Storage {
    /// Get a value and deserialize it into `T`.
    fn get_as<T>(&self, key: &str) -> impl Future<Output = Result<T, StorageError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move { codec::from_value(self.get(key).await?) }
    }

    /// Serialize `value` and store it under `key`.
    fn set_as<T>(
        &self,
        key: &str,
        value: &T,
    ) -> impl Future<Output = Result<(), StorageError>> + Send
    where
        T: Serialize + Sync + ?Sized,
    {
        async move {
            let value = codec::to_value(value)?;
            self.set(key, &value).await
        }
    }
}

impl<S: Storage> StorageExt for S {}
