//! Error types for flow editing, lifecycle and persistence.
//!
//! Every expected business failure maps to exactly one variant with a stable
//! `code()` so callers can render a precise message instead of a generic failure.

use crate::flow::types::{EdgeId, FlowId, FlowStatus, NodeId, NodeKind};
use thiserror::Error;

/// A structural edit rejected against the current graph state.
///
/// The editor never partially applies an edit: when one of these is returned the
/// input graph is the only graph that exists.
///
/// When a connection breaks several rules, the first failed check is reported, in
/// this order: `NodeNotFound` (source, then target), `SelfLoop`,
/// `IllegalOutgoingEdge`, `IllegalIncomingEdge`, `DuplicateEdge`. An outcome wired
/// into a trigger therefore reports `IllegalOutgoingEdge`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// No template with this subtype is registered for the kind.
    #[error("no {kind} template named '{subtype}'")]
    UnknownTemplate {
        /// Requested node kind.
        kind: NodeKind,
        /// Requested template key.
        subtype: String,
    },

    /// The referenced node is not part of the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The referenced edge is not part of the graph.
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    /// Source and target are the same node.
    #[error("node {0} cannot be connected to itself")]
    SelfLoop(NodeId),

    /// The target is a trigger; triggers accept no incoming edges.
    #[error("trigger node {node} cannot have incoming edges")]
    IllegalIncomingEdge {
        /// The trigger that was targeted.
        node: NodeId,
    },

    /// The source is an outcome; outcomes emit no outgoing edges.
    #[error("outcome node {node} cannot have outgoing edges")]
    IllegalOutgoingEdge {
        /// The outcome that was used as a source.
        node: NodeId,
    },

    /// An edge with the same ordered endpoints already exists.
    #[error("edge {existing} already connects {from} to {to}")]
    DuplicateEdge {
        /// Source node of the attempted edge.
        from: NodeId,
        /// Target node of the attempted edge.
        to: NodeId,
        /// The edge already holding this pair.
        existing: EdgeId,
    },
}

impl EditError {
    /// Stable identifier for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownTemplate { .. } => "unknown_template",
            Self::NodeNotFound(_) => "node_not_found",
            Self::EdgeNotFound(_) => "edge_not_found",
            Self::SelfLoop(_) => "self_loop",
            Self::IllegalIncomingEdge { .. } => "illegal_incoming_edge",
            Self::IllegalOutgoingEdge { .. } => "illegal_outgoing_edge",
            Self::DuplicateEdge { .. } => "duplicate_edge",
        }
    }
}

/// A serialized graph that does not describe a valid `FlowGraph`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two nodes share one id.
    #[error("duplicate node id {0}")]
    DuplicateNodeId(NodeId),

    /// Two edges share one id.
    #[error("duplicate edge id {0}")]
    DuplicateEdgeId(EdgeId),

    /// An edge references a node that is not in the graph.
    #[error("edge {edge} references missing node {node}")]
    DanglingEdge {
        /// The offending edge.
        edge: EdgeId,
        /// The missing endpoint.
        node: NodeId,
    },

    /// An edge breaks one of the structural connection rules.
    #[error(transparent)]
    Structural(#[from] EditError),
}

impl GraphError {
    /// Stable identifier; structural failures share the editor's codes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateNodeId(_) => "duplicate_node_id",
            Self::DuplicateEdgeId(_) => "duplicate_edge_id",
            Self::DanglingEdge { .. } => "dangling_edge",
            Self::Structural(error) => error.code(),
        }
    }
}

/// Fault raised by a persistence collaborator.
///
/// Kept apart from logical errors: retrying is the collaborator's business.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The database rejected or failed the request.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored record could not be encoded or decoded.
    #[error("record codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The backing store cannot be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "database_error",
            Self::Codec(_) => "record_codec_error",
            Self::Unavailable(_) => "storage_unavailable",
        }
    }
}

/// Failure of a `FlowStore` operation.
#[derive(Error, Debug)]
pub enum FlowError {
    /// No flow is stored under this id.
    #[error("flow {0} not found")]
    FlowNotFound(FlowId),

    /// The requested status change is not an edge of the lifecycle.
    #[error("flow {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Flow being transitioned.
        id: FlowId,
        /// Current status.
        from: FlowStatus,
        /// Requested status.
        to: FlowStatus,
    },

    /// The flow is archived and rejects further saves.
    #[error("flow {0} is archived and cannot be modified")]
    FlowImmutable(FlowId),

    /// Flows must carry a non-blank name.
    #[error("flow name must not be empty")]
    EmptyName,

    /// The persistence collaborator failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl FlowError {
    /// Stable identifier for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FlowNotFound(_) => "flow_not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::FlowImmutable(_) => "flow_immutable",
            Self::EmptyName => "empty_name",
            Self::Persistence(_) => "persistence_failure",
        }
    }
}
