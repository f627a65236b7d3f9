//! Station Application
//!
//! Rotates the current slot, regenerates stale halves through the generation
//! service and serves listeners over HTTP and WebSocket.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rotating_station::{config::StationConfig, station::Station};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rotating station");

    // Config path from args, else the platform default
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = StationConfig::discover(config_path.as_deref()).context("loading configuration")?;

    let station = Station::bind(config).await.context("starting station")?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
    };

    station.run(shutdown).await.context("running station")?;

    Ok(())
}
