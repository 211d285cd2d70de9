//! zoneflow server entry point
//!
//! Loads configuration from the environment and starts the HTTP server:
//! - Node templates at /api/templates/{kind}
//! - Flow lifecycle and graph edits at /api/flows/*
//! - Health check at /healthz

use zoneflow::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to 0.0.0.0:3004 and data/flows.db
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
