//! Server setup and initialization
//!
//! Wires together storage, the flow store, the graph editor and HTTP routes.
//! Provides the application factory used by `main` and by the HTTP tests.

use crate::{
    api::{create_flow_routes, create_template_routes, AppState},
    config::Config,
    flow::{
        editor::GraphEditor,
        memory::MemoryFlowStorage,
        storage::{FlowPersistence, SqliteFlowStorage},
        store::FlowStore,
    },
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Open the storage collaborator selected by the configuration
pub async fn open_storage(config: &Config) -> Result<Arc<dyn FlowPersistence>> {
    if config.database.in_memory {
        tracing::warn!("Using in-memory flow storage; flows are lost on restart");
        return Ok(Arc::new(MemoryFlowStorage::new()));
    }

    tracing::info!("📁 Ensuring data directory exists: {}", config.database.data_dir);
    std::fs::create_dir_all(&config.database.data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;

    let storage = SqliteFlowStorage::connect(config.database.database_path())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open flow database: {}", e))?;
    Ok(Arc::new(storage))
}

/// Build the router over an already opened storage collaborator
pub fn create_router(storage: Arc<dyn FlowPersistence>) -> Router {
    let state = AppState {
        store: Arc::new(FlowStore::new(storage)),
        editor: GraphEditor::default(),
    };

    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Node palette
        .merge(create_template_routes())
        // Flow lifecycle and edits
        .merge(create_flow_routes())
        .with_state(state)
}

/// Create the main Axum application with all routes
pub async fn create_app(config: Config) -> Result<Router> {
    let storage = open_storage(&config).await?;

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = create_router(storage);

    tracing::info!("✅ Application initialized successfully");
    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting zoneflow server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = config.server.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
