//! Directed policy graph
//!
//! A petgraph `DiGraph` plus a label index. Nodes are registered once by label;
//! edges between labels that were never registered are rejected instead of
//! creating phantom nodes.

use crate::error::{ModelError, ModelResult};
use crate::model::types::{Node, NodeKind};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;

/// Relation carried by a directed edge, implied by its endpoint kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Principal → Role
    Assigned,
    /// Role → Resource, or Resource → Role on an injected chain
    Grants,
    /// Principal → UserAttribute
    HasAttribute,
    /// ResourceAttribute → Resource
    AttributeOf,
    /// Principal → Permission, Permission → Resource
    Permits,
    /// Resource → PolicyClass
    ClassifiedUnder,
    /// Injected Principal → PolicyClass link
    EscalatesTo,
}

#[derive(Debug, Clone, Default)]
pub struct PolicyGraph {
    graph: DiGraph<Node, Relation>,
    index: HashMap<String, NodeIndex>,
}

impl PolicyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Registering the same label and kind again is a no-op.
    pub fn add_node(&mut self, node: Node) -> ModelResult<NodeIndex> {
        if let Some(&idx) = self.index.get(&node.label) {
            let existing = self.graph[idx].kind;
            if existing != node.kind {
                return Err(ModelError::ConflictingNode {
                    label: node.label,
                    existing,
                    requested: node.kind,
                });
            }
            return Ok(idx);
        }
        let label = node.label.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(label, idx);
        Ok(idx)
    }

    /// Connect two registered labels. Parallel edges collapse into one.
    pub fn add_edge(&mut self, from: &str, to: &str, relation: Relation) -> ModelResult<()> {
        let source = self.resolve(from, || format!("edge {from} -> {to}"))?;
        let target = self.resolve(to, || format!("edge {from} -> {to}"))?;
        if self.graph[source].kind == NodeKind::PolicyClass {
            return Err(ModelError::InvalidEdge {
                from: from.to_string(),
                to: to.to_string(),
                reason: "policy classes have no outgoing edges".to_string(),
            });
        }
        self.graph.update_edge(source, target, relation);
        Ok(())
    }

    fn resolve(&self, label: &str, context: impl FnOnce() -> String) -> ModelResult<NodeIndex> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| ModelError::DanglingReference {
                label: label.to_string(),
                context: context(),
            })
    }

    pub fn index_of(&self, label: &str) -> Option<NodeIndex> {
        self.index.get(label).copied()
    }

    pub fn node(&self, label: &str) -> Option<&Node> {
        self.index_of(label).map(|idx| &self.graph[idx])
    }

    pub fn node_at(&self, idx: NodeIndex) -> &Node {
        &self.graph[idx]
    }

    /// Direct successors of `idx`
    pub fn successors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Outgoing)
    }

    /// Nodes of one kind, in registration order
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(move |&idx| self.graph[idx].kind == kind)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Every edge as (source label, target label, relation)
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, Relation)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].label.as_str(),
                self.graph[edge.target()].label.as_str(),
                *edge.weight(),
            )
        })
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index_of(from), self.index_of(to)) {
            (Some(a), Some(b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node count plus edge count
    pub fn size(&self) -> usize {
        self.node_count() + self.edge_count()
    }

    pub fn inner(&self) -> &DiGraph<Node, Relation> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_graph() -> PolicyGraph {
        let mut graph = PolicyGraph::new();
        graph.add_node(Node::new("User_0", NodeKind::Principal)).unwrap();
        graph.add_node(Node::new("IAM", NodeKind::PolicyClass)).unwrap();
        graph.add_node(Node::new("Resource_0", NodeKind::Resource)).unwrap();
        graph
    }

    #[test]
    fn test_dangling_edge_fails_fast() {
        let mut graph = small_graph();
        let err = graph
            .add_edge("User_0", "Role_7", Relation::Assigned)
            .unwrap_err();
        assert!(matches!(err, ModelError::DanglingReference { ref label, .. } if label == "Role_7"));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 3, "no phantom node created");
    }

    #[test]
    fn test_parallel_edges_collapse() {
        let mut graph = small_graph();
        graph
            .add_edge("Resource_0", "IAM", Relation::ClassifiedUnder)
            .unwrap();
        graph
            .add_edge("Resource_0", "IAM", Relation::ClassifiedUnder)
            .unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge("Resource_0", "IAM"));
        assert!(!graph.has_edge("IAM", "Resource_0"));
        assert_eq!(graph.size(), 4);
    }

    #[test]
    fn test_policy_class_cannot_be_source() {
        let mut graph = small_graph();
        let err = graph
            .add_edge("IAM", "Resource_0", Relation::Grants)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_EDGE");
    }

    #[test]
    fn test_reregistering_label() {
        let mut graph = small_graph();
        let first = graph.index_of("User_0").unwrap();
        let again = graph
            .add_node(Node::new("User_0", NodeKind::Principal))
            .unwrap();
        assert_eq!(first, again);

        let err = graph
            .add_node(Node::new("User_0", NodeKind::Role))
            .unwrap_err();
        assert!(matches!(err, ModelError::ConflictingNode { .. }));
    }

    #[test]
    fn test_nodes_of_kind_in_registration_order() {
        let mut graph = small_graph();
        graph.add_node(Node::new("User_1", NodeKind::Principal)).unwrap();
        let labels: Vec<&str> = graph
            .nodes_of_kind(NodeKind::Principal)
            .map(|idx| graph.node_at(idx).label.as_str())
            .collect();
        assert_eq!(labels, vec!["User_0", "User_1"]);
    }
}
