//! Pass-role chain matching
//!
//! Recognizes exactly one shape: Principal → Role granting `iam:PassRole` →
//! Resource of type IAMRole → Role granting `ec2:RunInstances`. This is a
//! fixed-depth pattern match, not a reachability search.

use super::{Detection, EscalationMap, Evidence};
use crate::model::types::{Capability, NodeKind, ResourceType};
use crate::structure::graph::PolicyGraph;

pub fn detect_pass_role_chains(graph: &PolicyGraph) -> Detection {
    let mut escalations = EscalationMap::new();
    let mut traversals = 0u64;

    for principal in graph.nodes_of_kind(NodeKind::Principal) {
        'roles: for role in graph.successors(principal) {
            let role_node = graph.node_at(role);
            if role_node.kind != NodeKind::Role {
                continue;
            }
            traversals += 1;

            for resource in graph.successors(role) {
                let resource_node = graph.node_at(resource);
                if resource_node.resource_type() != Some(ResourceType::IamRole)
                    || !role_node.grants(Capability::PassRole)
                {
                    continue;
                }
                traversals += 1;

                for next_role in graph.successors(resource) {
                    let next_node = graph.node_at(next_role);
                    if next_node.kind == NodeKind::Role
                        && next_node.grants(Capability::RunInstances)
                    {
                        traversals += 1;
                        escalations.insert(
                            graph.node_at(principal).label.clone(),
                            Evidence::Chain {
                                hops: vec![
                                    role_node.label.clone(),
                                    resource_node.label.clone(),
                                    next_node.label.clone(),
                                ],
                            },
                        );
                        break 'roles;
                    }
                }
            }
        }
    }

    Detection::new(escalations, traversals)
}
