//! SQL storage layer.
//!
//! One table per namespace, two columns (`key` primary key, `value` JSON
//! text), one transaction per handle operation.

pub mod dialect;
pub mod handle;
pub mod pool;
pub mod provider;
pub mod schema;

pub use handle::SqlStorageHandle;
pub use provider::SqlStorageProvider;
