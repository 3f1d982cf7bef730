//! towermap CLI: place cell towers listed in a spreadsheet on a web map.
//!
//! Reads CID/LAC rows, looks each tower up for the chosen operator, and
//! writes a Leaflet page with one marker per tower found.

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
