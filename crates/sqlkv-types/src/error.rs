use thiserror::Error;

/// Errors raised by storage providers and handles.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Missing or malformed connection configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The key does not exist in the namespace.
    #[error("{0} doesn't exist")]
    NotFound(String),

    /// The database failed while running a transaction. The transaction
    /// has been rolled back.
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("encoded value is {size} bytes, limit is {max}")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage handle is closed")]
    Closed,
}

impl StorageError {
    /// True when the error means "key absent" rather than "storage unavailable".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for failures that may succeed if the caller retries later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}
