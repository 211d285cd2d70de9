//! Core flow type definitions
//!
//! Identifiers, node kinds, the lifecycle status machine and the `AutomationFlow`
//! record. These types are serialized to JSON for persistence and the HTTP API.

use crate::flow::graph::FlowGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

uuid_id! {
    /// Identifier of a node, unique within its graph and immutable once assigned.
    NodeId
}

uuid_id! {
    /// Identifier of an edge, unique within its graph.
    EdgeId
}

uuid_id! {
    /// Identifier of a stored flow.
    FlowId
}

/// The three node kinds of an automation graph
///
/// - Trigger: starts a flow, accepts no incoming edges
/// - Action: does work, may connect anywhere
/// - Outcome: terminal result, emits no outgoing edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Trigger,
    Action,
    Outcome,
}

impl NodeKind {
    /// All kinds in catalog order.
    pub const ALL: [NodeKind; 3] = [NodeKind::Trigger, NodeKind::Action, NodeKind::Outcome];

    /// Whether nodes of this kind may be the target of an edge.
    pub fn accepts_incoming(self) -> bool {
        !matches!(self, NodeKind::Trigger)
    }

    /// Whether nodes of this kind may be the source of an edge.
    pub fn emits_outgoing(self) -> bool {
        !matches!(self, NodeKind::Outcome)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::Action => "action",
            NodeKind::Outcome => "outcome",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trigger" => Ok(NodeKind::Trigger),
            "action" => Ok(NodeKind::Action),
            "outcome" => Ok(NodeKind::Outcome),
            other => Err(format!("unknown node kind '{other}'")),
        }
    }
}

/// Canvas coordinates of a node. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A typed vertex of a flow graph
///
/// Label and description are copied from the catalog template at creation time,
/// so later catalog changes never alter an existing node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Catalog template key (e.g. "patch_rollout")
    pub subtype: String,
    pub position: Position,
    pub label: String,
    pub description: String,
}

/// Directed connection between two nodes of the same graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationEdge {
    pub id: EdgeId,
    #[serde(rename = "source_node_id")]
    pub source: NodeId,
    #[serde(rename = "target_node_id")]
    pub target: NodeId,
}

/// Lifecycle state of a flow
///
/// Draft -> Active -> Archived, plus Draft -> Archived. Nothing leaves Archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Draft,
    Active,
    Archived,
}

impl FlowStatus {
    /// Whether `self -> next` is an edge of the lifecycle.
    pub fn can_transition_to(self, next: FlowStatus) -> bool {
        matches!(
            (self, next),
            (FlowStatus::Draft, FlowStatus::Active)
                | (FlowStatus::Active, FlowStatus::Archived)
                | (FlowStatus::Draft, FlowStatus::Archived)
        )
    }

    /// Draft and Active flows accept saves.
    pub fn is_editable(self) -> bool {
        !matches!(self, FlowStatus::Archived)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowStatus::Draft => "draft",
            FlowStatus::Active => "active",
            FlowStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who creates a flow and which zone/region it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerContext {
    /// Zone or region key used to scope listings (e.g. "eu-west/zone-a")
    pub scope: String,
    /// User or service account recorded as `created_by`
    pub principal: String,
}

impl OwnerContext {
    pub fn new(scope: impl Into<String>, principal: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            principal: principal.into(),
        }
    }
}

/// A named, versioned automation definition
///
/// The graph is owned exclusively by its flow. `version` starts at 1 and grows by
/// exactly one for every save that changes the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationFlow {
    pub id: FlowId,
    pub name: String,
    pub description: String,
    /// Zone/region this flow is listed under
    pub scope: String,
    pub graph: FlowGraph,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub version: u64,
    pub status: FlowStatus,
}

impl AutomationFlow {
    /// A fresh Draft flow at version 1 with an empty graph.
    pub fn draft(name: impl Into<String>, description: impl Into<String>, owner: &OwnerContext) -> Self {
        let now = Utc::now();
        Self {
            id: FlowId::new(),
            name: name.into(),
            description: description.into(),
            scope: owner.scope.clone(),
            graph: FlowGraph::new(),
            created_by: owner.principal.clone(),
            created_at: now,
            last_modified: now,
            version: 1,
            status: FlowStatus::Draft,
        }
    }

    pub fn summary(&self) -> FlowSummary {
        FlowSummary {
            id: self.id,
            name: self.name.clone(),
            version: self.version,
            status: self.status,
        }
    }
}

/// Listing entry for a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub id: FlowId,
    pub name: String,
    pub version: u64,
    pub status: FlowStatus,
}
