//! ContactDesk CLI — contact form intake service.
//!
//! Validates contact submissions, forwards them to chat webhooks, and serves
//! the contact and address-lookup endpoints over HTTP.

mod commands;
mod server;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{debug, warn};

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // Loaded before tracing so RUST_LOG and webhook vars can live in .env.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    commands::init_tracing(&cli);

    match dotenv {
        Ok(path) => debug!(?path, "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "failed to load .env"),
    }

    commands::run(cli).await
}
