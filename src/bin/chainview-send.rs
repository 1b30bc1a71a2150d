#![forbid(unsafe_code)]
//! Append a signed transaction to the pending pool

use chainview::cli;
use chainview::mempool::SubmitRequest;
use chainview::transaction::Signature;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Submit a signed transaction to the pending pool", long_about = None)]
struct Cli {
    /// Sender address
    #[arg(long)]
    from: String,
    /// Receiver address
    #[arg(long)]
    to: String,
    /// Amount to transfer
    #[arg(long)]
    value: u64,
    /// Signature recovery id
    #[arg(long)]
    v: String,
    /// Signature r component
    #[arg(long)]
    r: String,
    /// Signature s component
    #[arg(long)]
    s: String,
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    cli::init_tracing();
    let args = Cli::parse();

    let config = cli::load(&cli::config_path(args.config))?;
    let pool = cli::open_pool(&config)?;

    let request = SubmitRequest::new(
        args.from,
        args.to,
        args.value,
        Signature::new(args.v, args.r, args.s),
    );

    match pool.submit(request) {
        Ok(()) => {
            println!(
                "{}",
                "📥 Your transaction was added successfully to the mempool".bright_green()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "❌".red(), e.to_string().red());
            Err(e.into())
        }
    }
}
