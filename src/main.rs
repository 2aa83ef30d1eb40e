mod domain;
mod error;
mod backend;
mod uploader;
mod repository;
mod controller;
mod ui;
mod config;
mod app_system;

#[cfg(test)]
mod mock_framework;

use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, Instrument};

use crate::app_system::{setup_tracing, FormSystem};
use crate::config::Cli;
use crate::ui::Terminal;

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();

    // Setup tracing once for the entire application
    setup_tracing();

    let backend = cli.backend()?;
    let mut system = FormSystem::new(backend)?;
    info!("Starting user biodata form");

    let mut terminal = Terminal::new(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        system.controller.subscribe(),
    );

    let span = tracing::info_span!("session");
    terminal
        .run(&mut system.controller)
        .instrument(span)
        .await
        .map_err(|e| format!("Terminal I/O failed: {}", e))?;

    system.shutdown().await?;
    Ok(())
}
