//! Shared domain types for sqlkv.
//!
//! Namespaces, entries, storage configuration and the error type shared by
//! every storage backend.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod error;
pub mod storage;
