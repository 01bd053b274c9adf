//! Observability setup for sqlkv binaries.
//!
//! Library crates only emit `tracing` events; installing a subscriber is the
//! binary's job and goes through [`tracing_setup::init_tracing`].

pub mod tracing_setup;
