//! Policy-class reachability
//!
//! Breadth-first search from every principal over directed edges, with no depth
//! bound. A principal escalates when any policy class is reachable. BFS discovers
//! nodes in distance order, so the first policy class found is the nearest one and
//! its predecessor chain is a shortest path.

use super::{Detection, EscalationMap, Evidence};
use crate::model::types::NodeKind;
use crate::structure::graph::PolicyGraph;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, VecDeque};

pub fn detect_policy_class_reachability(graph: &PolicyGraph) -> Detection {
    let mut escalations = EscalationMap::new();
    let mut traversals = 0u64;

    for principal in graph.nodes_of_kind(NodeKind::Principal) {
        if let Some(path) = nearest_policy_class(graph, principal, &mut traversals) {
            escalations.insert(
                graph.node_at(principal).label.clone(),
                Evidence::Chain { hops: path },
            );
        }
    }

    Detection::new(escalations, traversals)
}

/// Labels from `start` (exclusive) to the nearest policy class (inclusive)
fn nearest_policy_class(
    graph: &PolicyGraph,
    start: NodeIndex,
    traversals: &mut u64,
) -> Option<Vec<String>> {
    let mut predecessor: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for next in graph.successors(current) {
            *traversals += 1;
            if next == start || predecessor.contains_key(&next) {
                continue;
            }
            predecessor.insert(next, current);
            if graph.node_at(next).kind == NodeKind::PolicyClass {
                return Some(unwind(graph, &predecessor, start, next));
            }
            queue.push_back(next);
        }
    }
    None
}

fn unwind(
    graph: &PolicyGraph,
    predecessor: &HashMap<NodeIndex, NodeIndex>,
    start: NodeIndex,
    end: NodeIndex,
) -> Vec<String> {
    let mut hops = vec![graph.node_at(end).label.clone()];
    let mut cursor = end;
    while let Some(&prev) = predecessor.get(&cursor) {
        if prev == start {
            break;
        }
        hops.push(graph.node_at(prev).label.clone());
        cursor = prev;
    }
    hops.reverse();
    hops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Node;
    use crate::structure::graph::Relation;

    fn bridge() -> PolicyGraph {
        let mut graph = PolicyGraph::new();
        for (label, kind) in [
            ("User_0", NodeKind::Principal),
            ("User_1", NodeKind::Principal),
            ("UserType:Admin", NodeKind::UserAttribute),
            ("iam:PassRole", NodeKind::Permission),
            ("Resource_0", NodeKind::Resource),
            ("IAM", NodeKind::PolicyClass),
        ] {
            graph.add_node(Node::new(label, kind)).unwrap();
        }
        graph
            .add_edge("User_0", "iam:PassRole", Relation::Permits)
            .unwrap();
        graph
            .add_edge("iam:PassRole", "Resource_0", Relation::Permits)
            .unwrap();
        graph
            .add_edge("Resource_0", "IAM", Relation::ClassifiedUnder)
            .unwrap();
        graph
            .add_edge("User_1", "UserType:Admin", Relation::HasAttribute)
            .unwrap();
        graph
    }

    #[test]
    fn test_shortest_path_evidence() {
        let detection = detect_policy_class_reachability(&bridge());
        assert_eq!(
            detection.escalations.get("User_0"),
            Some(&Evidence::Chain {
                hops: vec![
                    "iam:PassRole".to_string(),
                    "Resource_0".to_string(),
                    "IAM".to_string()
                ]
            })
        );
        assert_eq!(detection.path_complexity, 3.0);
    }

    #[test]
    fn test_unreachable_principal_not_flagged() {
        let detection = detect_policy_class_reachability(&bridge());
        assert!(!detection.is_flagged("User_1"));
        assert_eq!(detection.detected_count(), 1);
    }

    #[test]
    fn test_direct_link_is_nearest() {
        let mut graph = bridge();
        graph.add_node(Node::new("KMS", NodeKind::PolicyClass)).unwrap();
        graph
            .add_edge("User_0", "KMS", Relation::EscalatesTo)
            .unwrap();
        let detection = detect_policy_class_reachability(&graph);
        assert_eq!(
            detection.escalations.get("User_0"),
            Some(&Evidence::Chain {
                hops: vec!["KMS".to_string()]
            })
        );
    }

    #[test]
    fn test_cycles_terminate() {
        let mut graph = PolicyGraph::new();
        graph.add_node(Node::new("User_0", NodeKind::Principal)).unwrap();
        graph.add_node(Node::new("Role_0", NodeKind::Role)).unwrap();
        graph.add_node(Node::new("Role_1", NodeKind::Role)).unwrap();
        graph.add_edge("User_0", "Role_0", Relation::Assigned).unwrap();
        graph.add_edge("Role_0", "Role_1", Relation::Grants).unwrap();
        graph.add_edge("Role_1", "Role_0", Relation::Grants).unwrap();
        graph.add_edge("Role_1", "User_0", Relation::Grants).unwrap();

        let detection = detect_policy_class_reachability(&graph);
        assert!(detection.escalations.is_empty());
        assert_eq!(detection.traversal_count, 4, "each edge examined once");
    }

    #[test]
    fn test_traversals_count_examined_edges() {
        let detection = detect_policy_class_reachability(&bridge());
        // User_0: 3 edges to reach IAM; User_1: 1 edge to a dead end
        assert_eq!(detection.traversal_count, 4);
    }
}
