//! Table Builder CLI - Command-line interface
//!
//! Loads a dataset file into the in-memory stores and runs table queries,
//! location option building, and time-period listings against it.

mod cli;
mod commands;
mod dataset;
mod output;
mod storage;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(commands::execute(cli))
}
