//! Flow graph value type
//!
//! A `FlowGraph` is an immutable set of typed nodes and directed edges. It only
//! answers queries; every structural change goes through `GraphEditor`, which
//! derives a new graph value. Nodes and edges live in persistent ordered maps, so a
//! derived graph shares almost all of its storage with its predecessor and keeping
//! a full undo history stays cheap.
//!
//! Serialized form is `{ "nodes": [...], "edges": [...] }` in id order. Decoding
//! re-checks every structural rule, so an invalid graph can never be loaded.

use crate::error::{EditError, GraphError};
use crate::flow::types::{AutomationEdge, AutomationNode, EdgeId, NodeId, NodeKind};
use im::OrdMap;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which edges to follow when looking for neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDirection {
    /// Nodes with an edge into the given node
    Incoming,
    /// Nodes the given node has an edge to
    Outgoing,
    Both,
}

/// One automation definition: typed nodes plus directed edges
///
/// Invariants held by every value:
/// - every edge references two nodes of this graph, and never the same node twice
/// - at most one edge per ordered (source, target) pair
/// - triggers have no incoming edges, outcomes no outgoing edges
///
/// Cycles are allowed; by the rules above they can only run through action nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "GraphDocument", try_from = "GraphDocument")]
pub struct FlowGraph {
    nodes: OrdMap<NodeId, AutomationNode>,
    edges: OrdMap<EdgeId, AutomationEdge>,
}

impl FlowGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&AutomationNode> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&AutomationEdge> {
        self.edges.get(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains_key(&id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &AutomationNode> {
        self.nodes.values()
    }

    /// Edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &AutomationEdge> {
        self.edges.values()
    }

    /// Nodes of one kind, in id order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &AutomationNode> {
        self.nodes.values().filter(move |node| node.kind == kind)
    }

    /// Edges whose target is `id`.
    pub fn incoming_edges(&self, id: NodeId) -> Vec<&AutomationEdge> {
        self.edges.values().filter(|edge| edge.target == id).collect()
    }

    /// Edges whose source is `id`.
    pub fn outgoing_edges(&self, id: NodeId) -> Vec<&AutomationEdge> {
        self.edges.values().filter(|edge| edge.source == id).collect()
    }

    /// The edge holding the ordered pair (source, target), if any.
    pub fn edge_between(&self, source: NodeId, target: NodeId) -> Option<&AutomationEdge> {
        self.edges
            .values()
            .find(|edge| edge.source == source && edge.target == target)
    }

    /// Adjacent nodes in the given direction, deduplicated and in id order.
    ///
    /// An unknown id has no neighbours.
    pub fn neighbors(&self, id: NodeId, direction: EdgeDirection) -> Vec<&AutomationNode> {
        let mut adjacent = BTreeSet::new();

        for edge in self.edges.values() {
            let follow_out = matches!(direction, EdgeDirection::Outgoing | EdgeDirection::Both);
            let follow_in = matches!(direction, EdgeDirection::Incoming | EdgeDirection::Both);

            if follow_out && edge.source == id {
                adjacent.insert(edge.target);
            }
            if follow_in && edge.target == id {
                adjacent.insert(edge.source);
            }
        }

        adjacent.into_iter().filter_map(|node_id| self.nodes.get(&node_id)).collect()
    }

    /// Every node that lies on at least one directed cycle.
    pub fn detect_cycles(&self) -> BTreeSet<NodeId> {
        self.cyclic_components().into_iter().flatten().collect()
    }

    /// Strongly connected components that contain a cycle, each sorted, ordered by
    /// their smallest node id.
    pub fn cyclic_components(&self) -> Vec<Vec<NodeId>> {
        let mut digraph = DiGraphMap::<NodeId, ()>::with_capacity(self.nodes.len(), self.edges.len());
        for id in self.nodes.keys() {
            digraph.add_node(*id);
        }
        for edge in self.edges.values() {
            digraph.add_edge(edge.source, edge.target, ());
        }

        let mut components: Vec<Vec<NodeId>> = tarjan_scc(&digraph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || digraph.contains_edge(component[0], component[0])
            })
            .map(|mut component| {
                component.sort();
                component
            })
            .collect();
        components.sort();
        components
    }

    /// Advisory checks. Nothing reported here blocks editing, saving or activation.
    pub fn validate(&self) -> ValidationReport {
        let mut warnings: Vec<GraphWarning> = self
            .cyclic_components()
            .into_iter()
            .map(|nodes| GraphWarning::Cycle { nodes })
            .collect();

        if !self.is_empty() && self.nodes_of_kind(NodeKind::Trigger).next().is_none() {
            warnings.push(GraphWarning::NoTrigger);
        }

        ValidationReport { warnings }
    }

    /// Check the connection rules for a prospective edge.
    pub(crate) fn check_connection(&self, source: NodeId, target: NodeId) -> Result<(), EditError> {
        let source_node = self.nodes.get(&source).ok_or(EditError::NodeNotFound(source))?;
        let target_node = self.nodes.get(&target).ok_or(EditError::NodeNotFound(target))?;

        if source == target {
            return Err(EditError::SelfLoop(source));
        }
        if !source_node.kind.emits_outgoing() {
            return Err(EditError::IllegalOutgoingEdge { node: source });
        }
        if !target_node.kind.accepts_incoming() {
            return Err(EditError::IllegalIncomingEdge { node: target });
        }
        if let Some(existing) = self.edge_between(source, target) {
            return Err(EditError::DuplicateEdge {
                from: source,
                to: target,
                existing: existing.id,
            });
        }

        Ok(())
    }

    pub(crate) fn with_node(&self, node: AutomationNode) -> Self {
        Self {
            nodes: self.nodes.update(node.id, node),
            edges: self.edges.clone(),
        }
    }

    pub(crate) fn with_edge(&self, edge: AutomationEdge) -> Self {
        Self {
            nodes: self.nodes.clone(),
            edges: self.edges.update(edge.id, edge),
        }
    }

    /// Drop a node together with every edge touching it.
    pub(crate) fn without_node(&self, id: NodeId) -> Self {
        let edges = self
            .edges
            .iter()
            .filter(|(_, edge)| edge.source != id && edge.target != id)
            .map(|(edge_id, edge)| (*edge_id, edge.clone()))
            .collect();

        Self {
            nodes: self.nodes.without(&id),
            edges,
        }
    }

    pub(crate) fn without_edge(&self, id: EdgeId) -> Self {
        Self {
            nodes: self.nodes.clone(),
            edges: self.edges.without(&id),
        }
    }
}

/// Non-blocking findings about a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphWarning {
    /// These nodes form a directed cycle
    Cycle { nodes: Vec<NodeId> },
    /// The graph has nodes but nothing that could start it
    NoTrigger,
}

/// Result of `FlowGraph::validate`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub warnings: Vec<GraphWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn has_cycles(&self) -> bool {
        self.warnings
            .iter()
            .any(|warning| matches!(warning, GraphWarning::Cycle { .. }))
    }
}

/// Wire form of a graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<AutomationNode>,
    pub edges: Vec<AutomationEdge>,
}

impl From<FlowGraph> for GraphDocument {
    fn from(graph: FlowGraph) -> Self {
        Self {
            nodes: graph.nodes.values().cloned().collect(),
            edges: graph.edges.values().cloned().collect(),
        }
    }
}

impl TryFrom<GraphDocument> for FlowGraph {
    type Error = GraphError;

    fn try_from(document: GraphDocument) -> Result<Self, Self::Error> {
        let mut graph = FlowGraph::new();

        for node in document.nodes {
            if graph.nodes.contains_key(&node.id) {
                return Err(GraphError::DuplicateNodeId(node.id));
            }
            graph.nodes.insert(node.id, node);
        }

        for edge in document.edges {
            if graph.edges.contains_key(&edge.id) {
                return Err(GraphError::DuplicateEdgeId(edge.id));
            }
            for endpoint in [edge.source, edge.target] {
                if !graph.nodes.contains_key(&endpoint) {
                    return Err(GraphError::DanglingEdge {
                        edge: edge.id,
                        node: endpoint,
                    });
                }
            }
            graph.check_connection(edge.source, edge.target)?;
            graph.edges.insert(edge.id, edge);
        }

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::types::Position;

    fn node(kind: NodeKind, subtype: &str) -> AutomationNode {
        AutomationNode {
            id: NodeId::new(),
            kind,
            subtype: subtype.to_string(),
            position: Position::default(),
            label: subtype.to_string(),
            description: String::new(),
        }
    }

    fn edge(source: &AutomationNode, target: &AutomationNode) -> AutomationEdge {
        AutomationEdge {
            id: EdgeId::new(),
            source: source.id,
            target: target.id,
        }
    }

    fn decode(nodes: Vec<AutomationNode>, edges: Vec<AutomationEdge>) -> Result<FlowGraph, GraphError> {
        FlowGraph::try_from(GraphDocument { nodes, edges })
    }

    #[test]
    fn queries_follow_edge_direction() {
        let trigger = node(NodeKind::Trigger, "alert");
        let action = node(NodeKind::Action, "restart_service");
        let outcome = node(NodeKind::Outcome, "succeeded");
        let graph = decode(
            vec![trigger.clone(), action.clone(), outcome.clone()],
            vec![edge(&trigger, &action), edge(&action, &outcome)],
        )
        .unwrap();

        assert_eq!(graph.incoming_edges(action.id).len(), 1);
        assert_eq!(graph.outgoing_edges(action.id).len(), 1);
        assert!(graph.incoming_edges(trigger.id).is_empty());

        let out: Vec<_> = graph.neighbors(action.id, EdgeDirection::Outgoing).iter().map(|n| n.id).collect();
        assert_eq!(out, vec![outcome.id]);
        let inc: Vec<_> = graph.neighbors(action.id, EdgeDirection::Incoming).iter().map(|n| n.id).collect();
        assert_eq!(inc, vec![trigger.id]);
        assert_eq!(graph.neighbors(action.id, EdgeDirection::Both).len(), 2);
        assert!(graph.neighbors(NodeId::new(), EdgeDirection::Both).is_empty());
    }

    #[test]
    fn both_directions_deduplicate() {
        let a = node(NodeKind::Action, "notify");
        let b = node(NodeKind::Action, "run_script");
        let graph = decode(vec![a.clone(), b.clone()], vec![edge(&a, &b), edge(&b, &a)]).unwrap();

        let both = graph.neighbors(a.id, EdgeDirection::Both);
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, b.id);
    }

    #[test]
    fn acyclic_graph_reports_no_cycles() {
        let trigger = node(NodeKind::Trigger, "schedule");
        let action = node(NodeKind::Action, "patch_rollout");
        let graph = decode(vec![trigger.clone(), action.clone()], vec![edge(&trigger, &action)]).unwrap();

        assert!(graph.detect_cycles().is_empty());
        assert!(graph.validate().is_clean());
    }

    #[test]
    fn cycles_are_grouped_by_component() {
        let a = node(NodeKind::Action, "notify");
        let b = node(NodeKind::Action, "notify");
        let c = node(NodeKind::Action, "notify");
        let d = node(NodeKind::Action, "notify");
        let e = node(NodeKind::Action, "notify");
        let trigger = node(NodeKind::Trigger, "manual");
        let graph = decode(
            vec![a.clone(), b.clone(), c.clone(), d.clone(), e.clone(), trigger.clone()],
            vec![
                edge(&trigger, &a),
                edge(&a, &b),
                edge(&b, &a),
                edge(&c, &d),
                edge(&d, &c),
                edge(&d, &e),
            ],
        )
        .unwrap();

        let cyclic = graph.detect_cycles();
        assert_eq!(cyclic, BTreeSet::from([a.id, b.id, c.id, d.id]));

        let report = graph.validate();
        assert!(report.has_cycles());
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn missing_trigger_is_only_a_warning() {
        let action = node(NodeKind::Action, "notify");
        let graph = decode(vec![action], vec![]).unwrap();
        assert_eq!(graph.validate().warnings, vec![GraphWarning::NoTrigger]);
        assert!(FlowGraph::new().validate().is_clean());
    }

    #[test]
    fn decoding_rejects_broken_documents() {
        let trigger = node(NodeKind::Trigger, "webhook");
        let action = node(NodeKind::Action, "notify");
        let outcome = node(NodeKind::Outcome, "failed");

        let dup = decode(vec![action.clone(), action.clone()], vec![]);
        assert_eq!(dup.unwrap_err(), GraphError::DuplicateNodeId(action.id));

        let stray = node(NodeKind::Action, "notify");
        let dangling = decode(vec![action.clone()], vec![edge(&action, &stray)]);
        assert!(matches!(dangling, Err(GraphError::DanglingEdge { node, .. }) if node == stray.id));

        let into_trigger = decode(vec![trigger.clone(), action.clone()], vec![edge(&action, &trigger)]);
        assert_eq!(
            into_trigger.unwrap_err(),
            GraphError::Structural(EditError::IllegalIncomingEdge { node: trigger.id })
        );

        let from_outcome = decode(vec![outcome.clone(), action.clone()], vec![edge(&outcome, &action)]);
        assert_eq!(
            from_outcome.unwrap_err(),
            GraphError::Structural(EditError::IllegalOutgoingEdge { node: outcome.id })
        );

        let same = edge(&action, &action);
        assert!(matches!(
            decode(vec![action.clone()], vec![same]),
            Err(GraphError::Structural(EditError::SelfLoop(_)))
        ));

        let repeated = edge(&trigger, &action);
        let twice = decode(vec![trigger.clone(), action.clone()], vec![repeated.clone(), repeated]);
        assert!(matches!(twice, Err(GraphError::DuplicateEdgeId(_))));

        let parallel = decode(
            vec![trigger.clone(), action.clone()],
            vec![edge(&trigger, &action), edge(&trigger, &action)],
        );
        assert!(matches!(
            parallel,
            Err(GraphError::Structural(EditError::DuplicateEdge { .. }))
        ));
    }

    #[test]
    fn json_round_trip_keeps_ids() {
        let trigger = node(NodeKind::Trigger, "alert");
        let action = node(NodeKind::Action, "scale_capacity");
        let graph = decode(vec![trigger.clone(), action.clone()], vec![edge(&trigger, &action)]).unwrap();

        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
        assert!(json["edges"][0]["source_node_id"].is_string());

        let back: FlowGraph = serde_json::from_value(json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn cascade_removal_keeps_unrelated_edges() {
        let trigger = node(NodeKind::Trigger, "alert");
        let a = node(NodeKind::Action, "notify");
        let b = node(NodeKind::Action, "run_script");
        let keep = edge(&trigger, &b);
        let graph = decode(
            vec![trigger.clone(), a.clone(), b.clone()],
            vec![edge(&trigger, &a), edge(&a, &b), keep.clone()],
        )
        .unwrap();

        let pruned = graph.without_node(a.id);
        assert_eq!(pruned.node_count(), 2);
        assert_eq!(pruned.edges().collect::<Vec<_>>(), vec![&keep]);
        // the original value is untouched
        assert_eq!(graph.edge_count(), 3);
    }
}
