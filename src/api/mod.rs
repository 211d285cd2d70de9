//! HTTP API Layer
//!
//! REST endpoints over the flow builder:
//! - Node template listing
//! - Flow lifecycle (create, list, load, save, activate, archive)
//! - Structural graph edits applied and saved in one request

// JSON error responses with stable codes
pub mod error;

// Path, query and body extractors that reject with coded errors
pub mod extract;

// Flow lifecycle and graph edit endpoints
pub mod flows;

// Node template endpoints
pub mod templates;

pub use error::ApiError;
pub use flows::{create_flow_routes, AppState};
pub use templates::create_template_routes;
