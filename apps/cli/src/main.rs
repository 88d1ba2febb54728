//! docmesh CLI: aggregate Markdown documentation from many repositories.
//!
//! Clones or updates each configured repository, collects its Markdown files
//! into a file map, and renders the navigation for a single MkDocs site.

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
