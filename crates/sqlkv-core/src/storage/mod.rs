//! Storage abstractions for sqlkv.
//!
//! Defines the handle and plugin traits plus a typed extension trait.
//! Implementations live in sqlkv-infra.

pub mod ext;
pub mod kv_store;

pub use ext::StorageExt;
pub use kv_store::{Storage, StoragePlugin};
