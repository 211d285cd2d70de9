//! Flow management REST API endpoints
//!
//! Exposes the FlowStore lifecycle and the GraphEditor operation set. Graph edits
//! are applied to the last saved graph and saved in the same request, so every
//! accepted gesture produces exactly one new version.

use crate::{
    api::{
        error::ApiError,
        extract::{Json, Path, Query},
    },
    flow::{
        editor::{GraphEdit, GraphEditor},
        graph::{FlowGraph, GraphDocument, GraphWarning},
        registry::FlowCatalog,
        store::FlowStore,
        types::{AutomationFlow, FlowId, FlowSummary, OwnerContext},
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Versioned flow lifecycle over the configured storage
    pub store: Arc<FlowStore>,
    /// Graph editor bound to the process-wide node catalog
    pub editor: GraphEditor<'static>,
}

/// A flow together with its advisory graph warnings
#[derive(Debug, Serialize, Deserialize)]
pub struct FlowView {
    pub flow: AutomationFlow,
    pub warnings: Vec<GraphWarning>,
}

impl From<AutomationFlow> for FlowView {
    fn from(flow: AutomationFlow) -> Self {
        let warnings = flow.graph.validate().warnings;
        Self { flow, warnings }
    }
}

/// Request body for flow creation
#[derive(Debug, Deserialize)]
pub struct CreateFlowRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Zone/region the flow belongs to
    pub scope: String,
    pub created_by: String,
}

/// Request body for saving a flow
#[derive(Debug, Deserialize)]
pub struct SaveFlowRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Checked against the structural rules in the handler, so violations get
    /// their own error codes
    pub graph: GraphDocument,
}

#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    pub scope: String,
}

/// Response for flow listings
#[derive(Debug, Serialize, Deserialize)]
pub struct FlowListResponse {
    pub scope: String,
    pub flows: Vec<FlowSummary>,
}

/// Create flow management routes
pub fn create_flow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/flows", post(create_flow).get(list_flows))
        .route("/api/flows/{id}", get(get_flow).put(save_flow))
        .route("/api/flows/{id}/edits", post(apply_edit))
        .route("/api/flows/{id}/activate", post(activate_flow))
        .route("/api/flows/{id}/archive", post(archive_flow))
        .route("/api/flow-catalog", get(flow_catalog))
}

/// Create a new Draft flow
///
/// POST /api/flows
/// Body: { "name": "...", "description": "...", "scope": "...", "created_by": "..." }
async fn create_flow(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlowRequest>,
) -> Result<(StatusCode, Json<AutomationFlow>), ApiError> {
    let owner = OwnerContext::new(payload.scope, payload.created_by);
    let flow = state
        .store
        .create_flow(&payload.name, &payload.description, &owner)
        .await?;

    Ok((StatusCode::CREATED, Json(flow)))
}

/// List flows of a scope
///
/// GET /api/flows?scope=...
/// Returns: { "scope": "...", "flows": [{ "id": "...", "name": "...", "version": 1, "status": "draft" }] }
async fn list_flows(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<FlowListResponse>, ApiError> {
    let listing = state.store.list_flows(&query.scope);
    let flows = listing.collect().await?;
    Ok(Json(FlowListResponse {
        scope: listing.scope().to_string(),
        flows,
    }))
}

/// Load a flow with its warnings
///
/// GET /api/flows/:id
async fn get_flow(
    State(state): State<AppState>,
    Path(id): Path<FlowId>,
) -> Result<Json<FlowView>, ApiError> {
    let flow = state.store.load_flow(id).await?;
    Ok(Json(flow.into()))
}

/// Save name, description and a whole graph
///
/// PUT /api/flows/:id
/// Body: { "name": "...", "description": "...", "graph": { "nodes": [...], "edges": [...] } }
async fn save_flow(
    State(state): State<AppState>,
    Path(id): Path<FlowId>,
    Json(payload): Json<SaveFlowRequest>,
) -> Result<Json<FlowView>, ApiError> {
    let graph = FlowGraph::try_from(payload.graph)?;
    let current = state.store.load_flow(id).await?;
    let submitted = AutomationFlow {
        name: payload.name,
        description: payload.description,
        graph,
        ..current
    };

    let saved = state.store.save_flow(&submitted).await?;
    Ok(Json(saved.into()))
}

/// Apply one structural edit to the saved graph and save the result
///
/// POST /api/flows/:id/edits
/// Body: { "op": "connect", "source_node_id": "...", "target_node_id": "..." }
async fn apply_edit(
    State(state): State<AppState>,
    Path(id): Path<FlowId>,
    Json(edit): Json<GraphEdit>,
) -> Result<Json<FlowView>, ApiError> {
    let mut flow = state.store.load_flow(id).await?;
    flow.graph = state.editor.apply(&flow.graph, &edit)?;

    let saved = state.store.save_flow(&flow).await?;
    Ok(Json(saved.into()))
}

/// POST /api/flows/:id/activate
async fn activate_flow(
    State(state): State<AppState>,
    Path(id): Path<FlowId>,
) -> Result<Json<AutomationFlow>, ApiError> {
    Ok(Json(state.store.activate_flow(id).await?))
}

/// POST /api/flows/:id/archive
async fn archive_flow(
    State(state): State<AppState>,
    Path(id): Path<FlowId>,
) -> Result<Json<AutomationFlow>, ApiError> {
    Ok(Json(state.store.archive_flow(id).await?))
}

/// Ordered flow ids of a scope
///
/// GET /api/flow-catalog?scope=...
async fn flow_catalog(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<FlowCatalog>, ApiError> {
    Ok(Json(state.store.flow_catalog(&query.scope).await?))
}
