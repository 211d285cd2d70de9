//! Graph editor
//!
//! The only way to derive a new `FlowGraph` from an existing one. Each operation
//! takes the current graph by reference and returns either a complete, valid new
//! graph or a specific `EditError`; the input value is never touched. Because edits
//! are pure value transformations, undo/redo is a matter of keeping old graphs.

use crate::catalog::NodeCatalog;
use crate::error::EditError;
use crate::flow::graph::FlowGraph;
use crate::flow::types::{AutomationEdge, AutomationNode, EdgeId, NodeId, NodeKind, Position};
use serde::{Deserialize, Serialize};

/// A single structural edit, as sent by a diagram front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GraphEdit {
    AddNode {
        kind: NodeKind,
        subtype: String,
        #[serde(default)]
        position: Position,
    },
    RemoveNode {
        node_id: NodeId,
    },
    Connect {
        source_node_id: NodeId,
        target_node_id: NodeId,
    },
    Disconnect {
        edge_id: EdgeId,
    },
    MoveNode {
        node_id: NodeId,
        position: Position,
    },
}

/// Type-checked graph editing against a node catalog
#[derive(Debug, Clone, Copy)]
pub struct GraphEditor<'c> {
    catalog: &'c NodeCatalog,
}

impl Default for GraphEditor<'static> {
    /// Editor over the built-in catalog
    fn default() -> Self {
        Self::new(NodeCatalog::builtin())
    }
}

impl<'c> GraphEditor<'c> {
    pub fn new(catalog: &'c NodeCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'c NodeCatalog {
        self.catalog
    }

    /// Instantiate a catalog template as a new node.
    ///
    /// Returns the new graph and the id assigned to the node.
    pub fn add_node(
        &self,
        graph: &FlowGraph,
        kind: NodeKind,
        subtype: &str,
        position: Position,
    ) -> Result<(FlowGraph, NodeId), EditError> {
        let template = self
            .catalog
            .template(kind, subtype)
            .ok_or_else(|| EditError::UnknownTemplate {
                kind,
                subtype: subtype.to_string(),
            })?;

        let id = fresh_id(NodeId::new, |id| graph.contains_node(id));
        let node = AutomationNode {
            id,
            kind,
            subtype: template.subtype.clone(),
            position,
            label: template.label.clone(),
            description: template.description.clone(),
        };

        tracing::debug!("Adding {} node '{}' as {}", kind, subtype, id);
        Ok((graph.with_node(node), id))
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&self, graph: &FlowGraph, node_id: NodeId) -> Result<FlowGraph, EditError> {
        if !graph.contains_node(node_id) {
            return Err(EditError::NodeNotFound(node_id));
        }

        tracing::debug!("Removing node {} and its edges", node_id);
        Ok(graph.without_node(node_id))
    }

    /// Add a directed edge from `source` to `target`.
    ///
    /// Rules are checked in a fixed order: both endpoints exist, no self loop,
    /// source may emit, target may receive, pair not already connected.
    pub fn connect(
        &self,
        graph: &FlowGraph,
        source: NodeId,
        target: NodeId,
    ) -> Result<(FlowGraph, EdgeId), EditError> {
        graph.check_connection(source, target)?;

        let id = fresh_id(EdgeId::new, |id| graph.contains_edge(id));
        tracing::debug!("Connecting {} -> {} as {}", source, target, id);
        Ok((graph.with_edge(AutomationEdge { id, source, target }), id))
    }

    pub fn disconnect(&self, graph: &FlowGraph, edge_id: EdgeId) -> Result<FlowGraph, EditError> {
        if !graph.contains_edge(edge_id) {
            return Err(EditError::EdgeNotFound(edge_id));
        }

        tracing::debug!("Disconnecting edge {}", edge_id);
        Ok(graph.without_edge(edge_id))
    }

    /// Change only a node's canvas position.
    pub fn move_node(
        &self,
        graph: &FlowGraph,
        node_id: NodeId,
        position: Position,
    ) -> Result<FlowGraph, EditError> {
        let node = graph.node(node_id).ok_or(EditError::NodeNotFound(node_id))?;
        Ok(graph.with_node(AutomationNode {
            position,
            ..node.clone()
        }))
    }

    /// Apply one edit command.
    pub fn apply(&self, graph: &FlowGraph, edit: &GraphEdit) -> Result<FlowGraph, EditError> {
        match edit {
            GraphEdit::AddNode {
                kind,
                subtype,
                position,
            } => self.add_node(graph, *kind, subtype, *position).map(|(graph, _)| graph),
            GraphEdit::RemoveNode { node_id } => self.remove_node(graph, *node_id),
            GraphEdit::Connect {
                source_node_id,
                target_node_id,
            } => self
                .connect(graph, *source_node_id, *target_node_id)
                .map(|(graph, _)| graph),
            GraphEdit::Disconnect { edge_id } => self.disconnect(graph, *edge_id),
            GraphEdit::MoveNode { node_id, position } => self.move_node(graph, *node_id, *position),
        }
    }
}

/// Draw ids until one is not taken. Random UUIDs make a second draw vanishingly rare.
fn fresh_id<T: Copy>(generate: impl Fn() -> T, taken: impl Fn(T) -> bool) -> T {
    loop {
        let id = generate();
        if !taken(id) {
            return id;
        }
    }
}
