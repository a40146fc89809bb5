//! Escalation property tests: seeded grids over every supported variant.
//!
//! Tests verify:
//! - Every edge and hyperedge endpoint resolves to a registered node
//! - The 100/20/30 ABAC graph size equals nodes plus assigned and qualifying edges
//! - Re-running detection on one built structure yields the same escalation map
//! - Every injected ABAC chain is detected
//! - NGAC principals with no path to a policy class are never flagged
//! - NGAC detection accuracy never drops as the permission count grows
//! - The membership index agrees with a linear scan for every node

use policy_graph::model::{NodeKind, Population, ResourceType};
use policy_graph::structure::builder::build_abac_graph;
use policy_graph::{
    Detector, GeneratorOptions, ModelGenerator, ModelKind, PopulationSizes, RepetitionSpec,
    Strategy, StructureBuilder, StructureKind, VariantConfig,
};
use std::collections::BTreeSet;

const SEEDS: [u64; 6] = [0, 1, 7, 42, 1337, 90210];

fn generate(model: ModelKind, sizes: &PopulationSizes, gt: bool, seed: u64) -> Population {
    ModelGenerator::new(seed, GeneratorOptions::default().with_ground_truth(gt))
        .generate(model, sizes)
        .unwrap()
}

#[test]
fn test_no_dangling_references_across_variants() {
    let variants = [
        (ModelKind::Abac, StructureKind::Graph, PopulationSizes::abac(80, 16, 24)),
        (ModelKind::Ngac, StructureKind::Graph, PopulationSizes::ngac(40, 4, 12, 4, 8)),
        (ModelKind::Ngac, StructureKind::Hypergraph, PopulationSizes::ngac(40, 4, 12, 4, 8)),
    ];
    for seed in SEEDS {
        for (model, structure, sizes) in &variants {
            let population = generate(*model, sizes, true, seed);
            let built = StructureBuilder::new(seed)
                .build(&population, *structure)
                .unwrap();
            if let Some(graph) = built.as_graph() {
                for (from, to, _) in graph.edges() {
                    assert!(graph.node(from).is_some(), "seed {seed}: {from}");
                    assert!(graph.node(to).is_some(), "seed {seed}: {to}");
                }
            }
            if let Some(hypergraph) = built.as_hypergraph() {
                for edge in hypergraph.hyperedges() {
                    assert!(edge.members.len() >= 2);
                    for member in &edge.members {
                        assert!(hypergraph.node_kind(member).is_some(), "{}", edge.key);
                    }
                }
            }
        }
    }
}

#[test]
fn test_end_to_end_graph_size_identity() {
    for seed in SEEDS {
        let population = generate(ModelKind::Abac, &PopulationSizes::abac(100, 20, 30), false, seed);
        let Population::Abac(pop) = &population else {
            panic!("expected ABAC population");
        };

        let assigned: usize = pop.assignments.iter().map(|(_, roles)| roles.len()).sum();
        let qualifying: usize = pop
            .roles
            .iter()
            .flat_map(|role| pop.resources.iter().map(move |res| (role, res)))
            .filter(|(role, res)| {
                res.resource_type
                    .qualifying_capability()
                    .is_some_and(|cap| role.grants.contains(&cap))
            })
            .count();

        let spec = RepetitionSpec::new(
            VariantConfig::new(ModelKind::Abac, StructureKind::Graph, false),
            PopulationSizes::abac(100, 20, 30),
            0,
            seed,
        );
        let record = policy_graph::run_repetition(&spec).unwrap();
        assert_eq!(record.node_count, 150);
        assert_eq!(record.graph_size, 150 + assigned + qualifying, "seed {seed}");
    }
}

#[test]
fn test_detection_is_idempotent() {
    let cases = [
        (VariantConfig::new(ModelKind::Abac, StructureKind::Graph, true), PopulationSizes::abac(100, 20, 30)),
        (VariantConfig::new(ModelKind::Ngac, StructureKind::Graph, true), PopulationSizes::ngac(30, 0, 6, 0, 3)),
        (VariantConfig::new(ModelKind::Ngac, StructureKind::Hypergraph, true), PopulationSizes::ngac(30, 0, 6, 0, 3)),
    ];
    for (variant, sizes) in cases {
        let population = generate(variant.model, &sizes, true, 11);
        let built = StructureBuilder::new(11).build(&population, variant.structure).unwrap();
        let detector = Detector::for_variant(&variant).unwrap();
        let first = detector.detect(&built).unwrap();
        let second = detector.detect(&built).unwrap();
        assert_eq!(first, second, "{variant}");
    }
}

#[test]
fn test_every_injected_abac_chain_detected() {
    let detector = Detector::new(Strategy::PassRoleChain);
    for seed in SEEDS {
        for sizes in [
            PopulationSizes::abac(10, 5, 5),
            PopulationSizes::abac(200, 40, 60),
            PopulationSizes::abac(50, 0, 0),
        ] {
            let population = generate(ModelKind::Abac, &sizes, true, seed);
            let built = StructureBuilder::new(seed)
                .build(&population, StructureKind::Graph)
                .unwrap();
            let detection = detector.detect(&built).unwrap();
            for principal in population.ground_truth().keys() {
                assert!(detection.is_flagged(principal), "seed {seed}: {principal}");
            }
        }
    }
}

#[test]
fn test_abac_flags_only_complete_chains() {
    let detector = Detector::new(Strategy::PassRoleChain);
    for seed in SEEDS {
        let population = generate(ModelKind::Abac, &PopulationSizes::abac(60, 12, 20), false, seed);
        let Population::Abac(pop) = &population else {
            panic!("expected ABAC population");
        };
        let graph = build_abac_graph(pop).unwrap();
        let built = policy_graph::PolicyStructure::Graph(graph.clone());
        let detection = detector.detect(&built).unwrap();

        for (principal, evidence) in &detection.escalations {
            let policy_graph::Evidence::Chain { hops } = evidence else {
                panic!("ABAC evidence is always a chain");
            };
            let first = graph.node(&hops[0]).unwrap();
            let pivot = graph.node(&hops[1]).unwrap();
            let second = graph.node(&hops[2]).unwrap();
            assert!(graph.has_edge(principal, &hops[0]));
            assert!(first.grants(policy_graph::model::Capability::PassRole));
            assert_eq!(pivot.resource_type(), Some(ResourceType::IamRole));
            assert!(second.grants(policy_graph::model::Capability::RunInstances));
            assert_eq!(second.kind, NodeKind::Role);
        }
    }
}

#[test]
fn test_ngac_unreachable_principals_not_flagged() {
    // Without permissions there is no principal → resource bridge, so only
    // injected principals can reach a policy class.
    for seed in SEEDS {
        let population = generate(ModelKind::Ngac, &PopulationSizes::ngac(50, 0, 10, 0, 0), true, seed);
        let built = StructureBuilder::new(seed)
            .build(&population, StructureKind::Graph)
            .unwrap();
        let detection = Detector::new(Strategy::PolicyClassReachability)
            .detect(&built)
            .unwrap();
        let flagged: BTreeSet<&String> = detection.escalations.keys().collect();
        let injected: BTreeSet<&String> = population.ground_truth().keys().collect();
        assert_eq!(flagged, injected, "seed {seed}");
    }
}

#[test]
fn test_ngac_accuracy_monotonic_in_permissions() {
    for seed in SEEDS {
        let mut previous = 0.0;
        for permissions in [0, 1, 2, 5, 10, 20] {
            let spec = RepetitionSpec::new(
                VariantConfig::new(ModelKind::Ngac, StructureKind::Graph, true),
                PopulationSizes::ngac(40, 0, 8, 0, permissions),
                0,
                seed,
            );
            let record = policy_graph::run_repetition(&spec).unwrap();
            assert!(
                record.detection_accuracy >= previous,
                "seed {seed}: accuracy fell from {previous} to {} at {permissions} permissions",
                record.detection_accuracy
            );
            previous = record.detection_accuracy;
        }
        assert_eq!(previous, 1.0);
    }
}

#[test]
fn test_membership_index_equals_scan() {
    for seed in SEEDS {
        let population = generate(ModelKind::Ngac, &PopulationSizes::ngac(30, 0, 8, 0, 4), true, seed);
        let built = StructureBuilder::new(seed)
            .build(&population, StructureKind::Hypergraph)
            .unwrap();
        let hypergraph = built.as_hypergraph().unwrap();
        for (label, _) in hypergraph.nodes() {
            let indexed = hypergraph.incident_keys(label).cloned().unwrap_or_default();
            assert_eq!(indexed, hypergraph.incident_keys_by_scan(label), "{label}");
        }
    }
}
