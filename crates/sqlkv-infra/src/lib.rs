//! Infrastructure layer for sqlkv.
//!
//! Implements the storage traits defined in `sqlkv-core`: a SQL provider
//! (SQLite, PostgreSQL, MySQL through sqlx's `Any` driver) that maps each
//! namespace to its own table, an in-memory provider, and the configuration
//! loader.

pub mod config;
pub mod memory;
pub mod sql;
