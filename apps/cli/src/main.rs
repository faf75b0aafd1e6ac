//! circex CLI — regulatory circular reference extraction.
//!
//! Resolves citations between circulars into a content graph, and
//! walks whole department archives into structured JSON reports.

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
