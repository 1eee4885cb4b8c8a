//! cloudgraph CLI: ingest an Azure tenant into a local entity graph.
//!
//! Reads the directory and resource manager APIs, converts what it finds
//! into entities and relationships, and stores each run in a libSQL
//! database.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
