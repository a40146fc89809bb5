//! Hyperedge membership scan
//!
//! A node escalates when one of its incident hyperedges also contains a policy
//! class. Incidence comes from the hypergraph's membership index, so the cost per
//! node is its degree, not the total hyperedge count.

use super::{Detection, EscalationMap, Evidence};
use crate::model::types::NodeKind;
use crate::structure::hypergraph::Hypergraph;

/// Scan every node of the given kinds; first matching hyperedge wins
pub fn detect_policy_class_membership(hypergraph: &Hypergraph, scanned: &[NodeKind]) -> Detection {
    let mut escalations = EscalationMap::new();
    let mut traversals = 0u64;

    for &kind in scanned {
        for label in hypergraph.nodes_of_kind(kind) {
            for edge in hypergraph.incident_edges(label) {
                traversals += 1;
                let reaches_policy_class = edge
                    .members
                    .iter()
                    .any(|m| hypergraph.node_kind(m) == Some(NodeKind::PolicyClass));
                if reaches_policy_class {
                    escalations.insert(
                        label.to_string(),
                        Evidence::Hyperedge {
                            key: edge.key.clone(),
                            members: edge.members.iter().cloned().collect(),
                        },
                    );
                    break;
                }
            }
        }
    }

    Detection::new(escalations, traversals)
}
