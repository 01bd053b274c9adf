//! Storage contract for sqlkv.
//!
//! This crate defines the "ports" a host bot programs against: the
//! per-namespace [`storage::Storage`] handle and the [`storage::StoragePlugin`]
//! factory, plus the JSON value codec shared by every backend. It depends only
//! on `sqlkv-types` -- never on `sqlkv-infra` or any database crate.

pub mod codec;
pub mod storage;
