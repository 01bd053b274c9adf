//! JSON value codec.
//!
//! Values are stored as JSON text. Encoding enforces the width of the
//! `value` column so no backend ever receives an oversized value.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlkv_types::error::StorageError;
use sqlkv_types::storage::MAX_VALUE_BYTES;

/// Encode a value into its stored text form.
pub fn encode(value: &serde_json::Value) -> Result<String, StorageError> {
    let encoded = serde_json::to_string(value)
        .map_err(|e| StorageError::Serialization(format!("failed to serialize value: {e}")))?;
    if encoded.len() > MAX_VALUE_BYTES {
        return Err(StorageError::ValueTooLarge {
            size: encoded.len(),
            max: MAX_VALUE_BYTES,
        });
    }
    Ok(encoded)
}

/// Decode stored text back into a value.
pub fn decode(encoded: &str) -> Result<serde_json::Value, StorageError> {
    serde_json::from_str(encoded)
        .map_err(|e| StorageError::Serialization(format!("invalid JSON value: {e}")))
}

/// Convert any serializable type into a storable value.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<serde_json::Value, StorageError> {
    serde_json::to_value(value)
        .map_err(|e| StorageError::Serialization(format!("failed to serialize value: {e}")))
}

/// Convert a stored value back into a concrete type.
pub fn from_value<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, StorageError> {
    serde_json::from_value(value)
        .map_err(|e| StorageError::Serialization(format!("value has unexpected shape: {e}")))
}
