//! Policy model: node types and the synthetic population generator

pub mod generator;
pub mod types;

pub use generator::{
    AbacPopulation, AbacResource, GeneratorOptions, GroundTruth, Injection, ModelGenerator,
    NgacPopulation, NgacResource, Population, Principal, Role,
};
pub use types::{
    Attribute, AttributeDomain, Capability, Node, NodeKind, NodePayload, PolicyClass,
    ResourceType,
};
