// SPDX-License-Identifier: MIT
//
// BB84 QKD Simulator: Quantum Key Distribution and One-Time Pad
// Copyright (c) 2025 BB84 Simulator Contributors

//! BB84 Gateway binary
//!
//! Loads configuration, installs JSON logging and serves the protocol API.

use anyhow::{Context, Result};
use clap::Parser;
use qkd_core::config::GatewayConfig;
use qkd_gateway::{router, AppState};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "qkd-gateway")]
#[command(about = "BB84 Gateway - Simulates quantum key distribution over a REST API", long_about = None)]
struct Args {
    /// Path to configuration file (ignored if --env-mode is set)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Load configuration from environment variables instead of file
    #[arg(long, default_value = "false")]
    env_mode: bool,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Initialize tracing
    let log_level = args.log_level.parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .json()
        .init();

    info!("BB84 Gateway v{}", qkd_core::VERSION);

    // Load configuration
    let config = if args.env_mode {
        info!("Loading configuration from environment variables");
        GatewayConfig::from_env()
            .context("Failed to load configuration from environment")?
    } else if let Some(path) = &args.config {
        info!("Loading configuration from file: {:?}", path);
        GatewayConfig::from_file(path)
            .context("Failed to load configuration from file")?
    } else {
        info!("No configuration given, using defaults");
        GatewayConfig::default()
    };

    info!("Measurement backend: {:?}", config.measurement_backend);
    info!("Listen address: {}", config.listen_address);

    let addr = config.socket_addr().context("Invalid listen address")?;
    let app = router(AppState::new(config));

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
