//! Policy structures: the directed graph, the hypergraph and the builder that
//! materializes a population into either one.

pub mod builder;
pub mod graph;
pub mod hypergraph;

pub use builder::{
    build_abac_graph, build_ngac_graph, build_ngac_hypergraph, PolicyStructure, StructureBuilder,
};
pub use graph::{PolicyGraph, Relation};
pub use hypergraph::{
    sample_filesystem_grants, Hyperedge, HyperedgeCategory, Hypergraph, PermissionGrant,
};
