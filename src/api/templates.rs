//! Node template endpoints
//!
//! Lets a diagram front end populate its palette from the node catalog the
//! editor validates against.

use crate::{
    api::{
        extract::{Json, Path},
        flows::AppState,
    },
    catalog::NodeTemplate,
    flow::types::NodeKind,
};
use axum::{extract::State, routing::get, Router};

/// Create template listing routes
pub fn create_template_routes() -> Router<AppState> {
    Router::new().route("/api/templates/{kind}", get(list_templates))
}

/// List templates for one node kind, in catalog order
///
/// GET /api/templates/:kind   (kind: trigger | action | outcome)
/// An unknown kind is rejected with `invalid_path`.
async fn list_templates(
    State(state): State<AppState>,
    Path(kind): Path<NodeKind>,
) -> Json<Vec<NodeTemplate>> {
    Json(state.editor.catalog().list_templates(kind).to_vec())
}
