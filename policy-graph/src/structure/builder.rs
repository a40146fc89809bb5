//! Structure builder
//!
//! Materializes a generated population into a directed graph or a hypergraph.
//! Graph builds are pure functions of the population. The hypergraph build also
//! draws one permission and one resource per principal, from an RNG seeded with
//! the builder's `build_seed`, so a (population, seed) pair always yields the
//! same hypergraph.

use crate::error::{ModelError, ModelResult};
use crate::model::generator::{AbacPopulation, Injection, NgacPopulation, Population};
use crate::model::types::{Node, NodeKind};
use crate::structure::graph::{PolicyGraph, Relation};
use crate::structure::hypergraph::{HyperedgeCategory, Hypergraph};
use crate::variant::StructureKind;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

/// A built policy structure
#[derive(Debug, Clone)]
pub enum PolicyStructure {
    Graph(PolicyGraph),
    Hypergraph(Hypergraph),
}

impl PolicyStructure {
    pub fn kind(&self) -> StructureKind {
        match self {
            Self::Graph(_) => StructureKind::Graph,
            Self::Hypergraph(_) => StructureKind::Hypergraph,
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            Self::Graph(g) => g.node_count(),
            Self::Hypergraph(h) => h.node_count(),
        }
    }

    pub fn edge_count(&self) -> usize {
        match self {
            Self::Graph(g) => g.edge_count(),
            Self::Hypergraph(h) => h.edge_count(),
        }
    }

    /// Node count plus edge (or hyperedge) count
    pub fn size(&self) -> usize {
        self.node_count() + self.edge_count()
    }

    pub fn as_graph(&self) -> Option<&PolicyGraph> {
        match self {
            Self::Graph(g) => Some(g),
            Self::Hypergraph(_) => None,
        }
    }

    pub fn as_hypergraph(&self) -> Option<&Hypergraph> {
        match self {
            Self::Hypergraph(h) => Some(h),
            Self::Graph(_) => None,
        }
    }
}

/// Builds policy structures from generated populations
#[derive(Debug, Clone, Copy)]
pub struct StructureBuilder {
    build_seed: u64,
}

impl StructureBuilder {
    pub fn new(build_seed: u64) -> Self {
        Self { build_seed }
    }

    pub fn build(
        &self,
        population: &Population,
        structure: StructureKind,
    ) -> ModelResult<PolicyStructure> {
        let built = match (population, structure) {
            (Population::Abac(pop), StructureKind::Graph) => {
                PolicyStructure::Graph(build_abac_graph(pop)?)
            }
            (Population::Ngac(pop), StructureKind::Graph) => {
                PolicyStructure::Graph(build_ngac_graph(pop)?)
            }
            (Population::Ngac(pop), StructureKind::Hypergraph) => {
                let mut rng = StdRng::seed_from_u64(self.build_seed);
                PolicyStructure::Hypergraph(build_ngac_hypergraph(pop, &mut rng)?)
            }
            (Population::Abac(_), StructureKind::Hypergraph) => {
                return Err(ModelError::UnsupportedVariant {
                    message: "no hypergraph construction rules for the ABAC model".to_string(),
                })
            }
        };
        debug!(
            structure = %built.kind(),
            nodes = built.node_count(),
            edges = built.edge_count(),
            "Built policy structure"
        );
        Ok(built)
    }
}

/// ABAC: principal → role per assignment, role → resource when the role grants
/// the capability the resource type requires, then the injected chains.
pub fn build_abac_graph(pop: &AbacPopulation) -> ModelResult<PolicyGraph> {
    let mut graph = PolicyGraph::new();

    for principal in &pop.principals {
        graph.add_node(Node::new(principal.label.as_str(), NodeKind::Principal))?;
    }
    for role in &pop.roles {
        graph.add_node(Node::role(role.label.as_str(), role.grants.clone()))?;
    }
    for resource in &pop.resources {
        graph.add_node(Node::typed_resource(
            resource.label.as_str(),
            resource.resource_type,
        ))?;
    }

    for (principal, roles) in &pop.assignments {
        for role in roles {
            graph.add_edge(principal, role, Relation::Assigned)?;
        }
    }

    for role in &pop.roles {
        for resource in &pop.resources {
            let qualifies = resource
                .resource_type
                .qualifying_capability()
                .is_some_and(|cap| role.grants.contains(&cap));
            if qualifies {
                graph.add_edge(&role.label, &resource.label, Relation::Grants)?;
            }
        }
    }

    for injection in &pop.injections {
        wire_injection(&mut graph, injection)?;
    }

    Ok(graph)
}

/// NGAC: attribute assignments plus the dense principal → permission →
/// resource → policy class bridge, then the injected policy-class links.
pub fn build_ngac_graph(pop: &NgacPopulation) -> ModelResult<PolicyGraph> {
    let mut graph = PolicyGraph::new();
    let permissions = pop.distinct_permissions();

    for principal in &pop.principals {
        graph.add_node(Node::new(principal.label.as_str(), NodeKind::Principal))?;
        for attribute in &principal.attributes {
            let label = attribute.shared_label();
            graph.add_node(Node::new(label.as_str(), NodeKind::UserAttribute))?;
            graph.add_edge(&principal.label, &label, Relation::HasAttribute)?;
        }
    }

    for resource in &pop.resources {
        graph.add_node(Node::new(resource.label.as_str(), NodeKind::Resource))?;
        for attribute in &resource.attributes {
            let label = attribute.shared_label();
            graph.add_node(Node::new(label.as_str(), NodeKind::ResourceAttribute))?;
            graph.add_edge(&label, &resource.label, Relation::AttributeOf)?;
        }
    }

    for permission in &permissions {
        graph.add_node(Node::new(permission.as_str(), NodeKind::Permission))?;
    }
    for policy_class in &pop.policy_classes {
        graph.add_node(Node::new(policy_class.label(), NodeKind::PolicyClass))?;
    }

    for principal in &pop.principals {
        for permission in &permissions {
            graph.add_edge(&principal.label, permission.as_str(), Relation::Permits)?;
        }
    }
    for permission in &permissions {
        for resource in &pop.resources {
            graph.add_edge(permission.as_str(), &resource.label, Relation::Permits)?;
        }
    }
    for resource in &pop.resources {
        for policy_class in &pop.policy_classes {
            graph.add_edge(&resource.label, policy_class.label(), Relation::ClassifiedUnder)?;
        }
    }

    for injection in &pop.injections {
        wire_injection(&mut graph, injection)?;
    }

    Ok(graph)
}

fn wire_injection(graph: &mut PolicyGraph, injection: &Injection) -> ModelResult<()> {
    match injection {
        Injection::RoleChain {
            principal,
            elevated_role,
            pivot,
            reentry_role,
        } => {
            graph.add_node(Node::role(
                elevated_role.label.as_str(),
                elevated_role.grants.clone(),
            ))?;
            graph.add_node(Node::typed_resource(pivot.label.as_str(), pivot.resource_type))?;
            graph.add_node(Node::role(
                reentry_role.label.as_str(),
                reentry_role.grants.clone(),
            ))?;
            graph.add_edge(principal, &elevated_role.label, Relation::Assigned)?;
            graph.add_edge(&elevated_role.label, &pivot.label, Relation::Grants)?;
            graph.add_edge(&pivot.label, &reentry_role.label, Relation::Grants)?;
        }
        Injection::PolicyClassLink {
            principal,
            policy_class,
        } => {
            graph.add_node(Node::new(policy_class.label(), NodeKind::PolicyClass))?;
            graph.add_edge(principal, policy_class.label(), Relation::EscalatesTo)?;
        }
    }
    Ok(())
}

/// NGAC hypergraph. Attribute nodes are owned per entity (`User_3_UserType:Admin`).
pub fn build_ngac_hypergraph(pop: &NgacPopulation, rng: &mut StdRng) -> ModelResult<Hypergraph> {
    let mut hypergraph = Hypergraph::new();
    let mut counter = 0usize;
    let mut next_key = |category: HyperedgeCategory| {
        let key = format!("{}_{}", category.key_prefix(), counter);
        counter += 1;
        key
    };

    for principal in &pop.principals {
        hypergraph.add_node(principal.label.as_str(), NodeKind::Principal)?;
    }
    for resource in &pop.resources {
        hypergraph.add_node(resource.label.as_str(), NodeKind::Resource)?;
    }
    let permissions = pop.distinct_permissions();
    for permission in &permissions {
        hypergraph.add_node(permission.as_str(), NodeKind::Permission)?;
    }
    for policy_class in &pop.policy_classes {
        hypergraph.add_node(policy_class.label(), NodeKind::PolicyClass)?;
    }

    for principal in &pop.principals {
        let mut members = vec![principal.label.clone()];
        if let Some(permission) = pop.permissions.choose(rng) {
            members.push(permission.as_str().to_string());
        }
        if let Some(resource) = pop.resources.choose(rng) {
            members.push(resource.label.clone());
        }
        if members.len() >= 2 {
            hypergraph.add_hyperedge(
                next_key(HyperedgeCategory::PrincipalBinding),
                HyperedgeCategory::PrincipalBinding,
                members,
            )?;
        }

        for attribute in &principal.attributes {
            let label = attribute.owned_label(&principal.label);
            hypergraph.add_node(label.as_str(), NodeKind::UserAttribute)?;
            hypergraph.add_hyperedge(
                next_key(HyperedgeCategory::Attribute),
                HyperedgeCategory::Attribute,
                [principal.label.clone(), label],
            )?;
        }
    }

    for injection in &pop.injections {
        match injection {
            Injection::PolicyClassLink {
                principal,
                policy_class,
            } => {
                hypergraph.add_hyperedge(
                    next_key(HyperedgeCategory::GroundTruth),
                    HyperedgeCategory::GroundTruth,
                    [principal.clone(), policy_class.label().to_string()],
                )?;
            }
            Injection::RoleChain { .. } => {
                return Err(ModelError::UnsupportedVariant {
                    message: "role-chain ground truth cannot be wired into a hypergraph"
                        .to_string(),
                })
            }
        }
    }

    for resource in &pop.resources {
        for attribute in &resource.attributes {
            let label = attribute.owned_label(&resource.label);
            hypergraph.add_node(label.as_str(), NodeKind::ResourceAttribute)?;
            hypergraph.add_hyperedge(
                next_key(HyperedgeCategory::Attribute),
                HyperedgeCategory::Attribute,
                [label, resource.label.clone()],
            )?;
        }
    }

    for permission in &permissions {
        for resource in &pop.resources {
            hypergraph.add_hyperedge(
                next_key(HyperedgeCategory::Grant),
                HyperedgeCategory::Grant,
                [permission.as_str().to_string(), resource.label.clone()],
            )?;
        }
    }

    for resource in &pop.resources {
        for policy_class in &pop.policy_classes {
            hypergraph.add_hyperedge(
                next_key(HyperedgeCategory::PolicyClass),
                HyperedgeCategory::PolicyClass,
                [resource.label.clone(), policy_class.label().to_string()],
            )?;
        }
    }

    Ok(hypergraph)
}
