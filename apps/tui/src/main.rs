//! towermap TUI — interactive terminal front end for tower mapping runs.
//!
//! Pick a spreadsheet and operator on the Run tab, watch towers resolve,
//! and inspect placed markers on the Markers tab. Built with `ratatui` +
//! `crossterm`.

mod app;
mod screens;
mod surface;
mod widgets;

use std::fs::File;
use std::sync::Mutex;

use color_eyre::eyre::Result;
use towermap_shared::{config_dir, load_config};

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let config = load_config()?;
    app::run(&config)
}

/// Log to `~/.towermap/tui.log`; stderr would draw over the alternate screen.
fn init_tracing() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)?;
    let file = File::create(dir.join("tui.log"))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("towermap=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
