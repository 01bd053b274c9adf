//! CLI command definitions for the `sqlkv` binary.
//!
//! Uses clap derive macros for argument parsing. Every data command takes the
//! namespace first (e.g., `sqlkv set prefs color blue`).

pub mod kv;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Inspect and edit bot storage namespaces.
#[derive(Parser)]
#[command(name = "sqlkv", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database URL (sqlite://, postgresql://, mysql://).
    #[arg(long, global = true, env = "SQLKV_DATA_URL")]
    pub data_url: Option<String>,

    /// TOML file with storage settings (`[storage]` table or top-level keys).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log every SQL statement (visible with -vv).
    #[arg(long, global = true)]
    pub debug_sql: bool,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get a value by key.
    Get {
        /// Namespace name.
        namespace: String,

        /// Key name.
        key: String,
    },

    /// Set a key-value pair (value is JSON).
    Set {
        /// Namespace name.
        namespace: String,

        /// Key name.
        key: String,

        /// JSON value (string, number, object, array, boolean, null).
        value: String,
    },

    /// Remove a key-value pair.
    #[command(alias = "rm")]
    Remove {
        /// Namespace name.
        namespace: String,

        /// Key name.
        key: String,
    },

    /// List all keys in a namespace.
    #[command(alias = "ls")]
    Keys {
        /// Namespace name.
        namespace: String,
    },

    /// Count the entries in a namespace.
    Count {
        /// Namespace name.
        namespace: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
