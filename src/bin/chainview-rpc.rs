#![forbid(unsafe_code)]
//! Chainview query server

use chainview::api::{run_api_server, Node};
use chainview::cli;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Serve ledger queries and accept pending transactions", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the listening port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    cli::init_tracing();
    let args = Cli::parse();

    let mut config = cli::load(&cli::config_path(args.config))?;
    if let Some(port) = args.port {
        config.api.port = port;
    }

    cli::open_pool(&config)?;
    tracing::info!(
        blocks = %config.store.blocks_path.display(),
        accounts = %config.store.accounts_path.display(),
        mempool = %config.store.mempool_path.display(),
        schema = ?config.store.header_schema,
        "Starting Chainview"
    );

    let node = Arc::new(Node::from_config(&config));
    run_api_server(node, &config.api).await
}
