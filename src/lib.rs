//! zoneflow: automation flow builder for zones and regions
//!
//! Models Trigger -> Action -> Outcome automation definitions as typed directed
//! graphs, edits them through type-checked pure operations, and keeps them as
//! named, versioned flows with a Draft/Active/Archived lifecycle. Executing flows
//! is out of scope; this crate defines them and guards their validity.

// Core configuration and setup
pub mod config;

// Typed errors with stable codes
pub mod error;

// Process-wide node template catalog
pub mod catalog;

// Flow model, editor, storage and lifecycle
pub mod flow;

// HTTP API layer - REST endpoints over the flow store and editor
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use catalog::{NodeCatalog, NodeTemplate};
pub use error::{EditError, FlowError, GraphError, PersistenceError};
pub use flow::{
    AutomationFlow, FlowGraph, FlowStatus, FlowStore, GraphEdit, GraphEditor, NodeKind, OwnerContext,
};
pub use server::start_server;
