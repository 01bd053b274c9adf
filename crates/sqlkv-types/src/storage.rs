//! Storage types for sqlkv.
//!
//! A namespace is a named partition of key/value entries, backed by one
//! table. Entries hold JSON values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Maximum key length in bytes (width of the `key` column).
pub const MAX_KEY_BYTES: usize = 767;

/// Maximum encoded value length in bytes (width of the `value` column).
pub const MAX_VALUE_BYTES: usize = 32_768;

/// Validated namespace name.
///
/// Only emptiness and NUL characters are checked here. Identifier length
/// limits depend on the backend and are enforced when the namespace is opened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Result<Self, StorageError> {
        let name = name.into();
        if name.is_empty() {
            return Err(StorageError::InvalidNamespace(
                "namespace must not be empty".to_string(),
            ));
        }
        if name.contains('\0') {
            return Err(StorageError::InvalidNamespace(
                "namespace must not contain NUL characters".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Namespace {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(value: Namespace) -> Self {
        value.0
    }
}

/// One key/value pair within a namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: serde_json::Value,
}

/// Whether `key` fits the `key` column. A key that does not fit can never have
/// been stored, so lookups and deletes treat it as absent.
pub fn key_fits(key: &str) -> bool {
    key.len() <= MAX_KEY_BYTES
}

/// Reject keys that do not fit the `key` column.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if !key_fits(key) {
        return Err(StorageError::InvalidKey(format!(
            "key is {} bytes, limit is {MAX_KEY_BYTES}",
            key.len()
        )));
    }
    Ok(())
}
