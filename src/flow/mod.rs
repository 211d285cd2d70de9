//! Flow management layer
//!
//! This module holds the automation flow model and everything that changes it:
//! - Type definitions (ids, node kinds, AutomationFlow, lifecycle status)
//! - The immutable FlowGraph value and its queries
//! - GraphEditor, the only producer of new graphs, plus undo/redo history
//! - FlowStore, the versioned lifecycle over a persistence collaborator
//! - SQLite and in-memory persistence collaborators
//! - Per-scope flow catalogs

// Core flow type definitions
pub mod types;

// Immutable graph value, queries and cycle analysis
pub mod graph;

// Type-checked structural edits
pub mod editor;

// Undo/redo over graph values
pub mod history;

// Persistence contract and SQLite storage
pub mod storage;

// Lock-free in-memory storage
pub mod memory;

// Per-scope catalogs of flow ids
pub mod registry;

// Versioned lifecycle
pub mod store;

// Re-export commonly used types
pub use editor::{GraphEdit, GraphEditor};
pub use graph::{EdgeDirection, FlowGraph, GraphWarning, ValidationReport};
pub use history::EditHistory;
pub use memory::MemoryFlowStorage;
pub use registry::FlowCatalog;
pub use storage::{FlowPersistence, SqliteFlowStorage};
pub use store::{FlowListing, FlowStore};
pub use types::{
    AutomationEdge, AutomationFlow, AutomationNode, EdgeId, FlowId, FlowStatus, FlowSummary, NodeId,
    NodeKind, OwnerContext, Position,
};
