//! sqlkv command-line entry point.
//!
//! Binary name: `sqlkv`
//!
//! Parses CLI arguments, initializes tracing and the storage provider, then
//! dispatches to the namespace command handlers.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use sqlkv_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        verbosity: cli.verbose,
        quiet: cli.quiet,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need storage
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "sqlkv", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.config.as_deref(), cli.data_url.clone(), cli.debug_sql).await?;
    let result = run(&cli, &state).await;

    state.shutdown().await;
    shutdown_tracing();
    result
}

async fn run(cli: &Cli, state: &AppState) -> anyhow::Result<()> {
    let plugin = &state.provider;
    match &cli.command {
        Commands::Get { namespace, key } => cli::kv::kv_get(plugin, namespace, key, cli.json).await,
        Commands::Set {
            namespace,
            key,
            value,
        } => cli::kv::kv_set(plugin, namespace, key, value, cli.json).await,
        Commands::Remove { namespace, key } => {
            cli::kv::kv_remove(plugin, namespace, key, cli.json).await
        }
        Commands::Keys { namespace } => cli::kv::kv_keys(plugin, namespace, cli.json).await,
        Commands::Count { namespace } => cli::kv::kv_count(plugin, namespace, cli.json).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}
