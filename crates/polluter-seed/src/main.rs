//! Seeding entry point for the polluter workspace.
//!
//! Reads the target store from the environment, connects to it once, and
//! applies each fixture file given on the command line in order. With no
//! arguments, or an argument of `-`, the fixture is read from stdin.
//!
//! ```text
//! POLLUTER_ENGINE=postgres POLLUTER_URL=postgresql://... polluter-seed users.yml roles.json
//! ```
//!
//! The run stops at the first failing input. Inputs applied before it stay
//! applied.

mod config;
mod error;
mod seed;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::SeedConfig;

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables,
/// connects to the configured store and seeds it from every input.
///
/// # Errors
///
/// Returns an error if configuration, connection or any input fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("polluter-seed starting");

    let config = SeedConfig::from_env()?;
    info!(
        engine = ?config.engine,
        format = config.format.map(polluter::Parser::name),
        max_connections = config.max_connections,
        connect_timeout_ms = config.connect_timeout.as_millis(),
        "configuration loaded"
    );

    let engine = seed::connect(&config).await?;
    let inputs = seed::inputs(std::env::args().skip(1).collect());

    if let Err(e) = seed::run(&config, engine, &inputs).await {
        error!(error = %e, "seeding failed");
        return Err(e.into());
    }
    Ok(())
}
