//! One repetition: generate → build → detect → score
//!
//! Everything a repetition touches is owned by the call, so repetitions can run on
//! separate threads without sharing state.

use crate::detector::{Detector, DetectorOptions, Strategy};
use crate::error::ModelResult;
use crate::model::generator::{GeneratorOptions, ModelGenerator};
use crate::scorer::{ScoreWarning, Scorecard};
use crate::structure::builder::StructureBuilder;
use crate::variant::{PopulationSizes, VariantConfig};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Stream id mixed into the repetition seed for the hypergraph build RNG
const BUILD_STREAM: u64 = 0xB1D;

/// Derive an independent seed for `stream` from `base` (SplitMix64 finalizer)
pub fn derive_seed(base: u64, stream: u64) -> u64 {
    let mut z = base
        .wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Inputs for one repetition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepetitionSpec {
    pub variant: VariantConfig,
    pub sizes: PopulationSizes,
    pub repetition: u32,
    pub seed: u64,
    pub generator: GeneratorOptions,
    pub detector: DetectorOptions,
}

impl RepetitionSpec {
    pub fn new(variant: VariantConfig, sizes: PopulationSizes, repetition: u32, seed: u64) -> Self {
        Self {
            variant,
            sizes,
            repetition,
            seed,
            generator: GeneratorOptions::default().with_ground_truth(variant.ground_truth),
            detector: DetectorOptions::default(),
        }
    }

    pub fn with_generator_options(mut self, options: GeneratorOptions) -> Self {
        self.generator = options.with_ground_truth(self.variant.ground_truth);
        self
    }

    pub fn with_detector_options(mut self, options: DetectorOptions) -> Self {
        self.detector = options;
        self
    }
}

/// One result row per (configuration, repetition)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionRecord {
    pub variant: VariantConfig,
    pub strategy: Strategy,
    pub sizes: PopulationSizes,
    pub repetition: u32,
    pub seed: u64,
    pub detection_accuracy: f64,
    pub path_complexity: f64,
    pub traversal_count: u64,
    pub generation_elapsed: Duration,
    pub build_elapsed: Duration,
    pub detection_elapsed: Duration,
    pub node_count: usize,
    pub edge_count: usize,
    /// Node count plus edge (or hyperedge) count
    pub graph_size: usize,
    pub detected_count: usize,
    pub ground_truth_count: usize,
    /// Present only when ground truth was modeled
    pub true_positives: Option<usize>,
    pub false_positives: Option<usize>,
    pub false_negatives: Option<usize>,
    pub false_positive_rate: Option<f64>,
    pub false_negative_rate: Option<f64>,
    #[serde(default)]
    pub warnings: Vec<ScoreWarning>,
}

/// Run one repetition end to end
pub fn run_repetition(spec: &RepetitionSpec) -> ModelResult<RepetitionRecord> {
    spec.variant.validate()?;
    let detector = Detector::for_variant(&spec.variant)?.with_options(spec.detector);

    let started = Instant::now();
    let population =
        ModelGenerator::new(spec.seed, spec.generator).generate(spec.variant.model, &spec.sizes)?;
    let generation_elapsed = started.elapsed();

    let started = Instant::now();
    let structure = StructureBuilder::new(derive_seed(spec.seed, BUILD_STREAM))
        .build(&population, spec.variant.structure)?;
    let build_elapsed = started.elapsed();

    let started = Instant::now();
    let detection = detector.detect(&structure)?;
    let detection_elapsed = started.elapsed();

    let ground_truth = population.ground_truth();
    let card = Scorecard::compute(
        &detection.escalations,
        ground_truth,
        population.principal_count(),
        spec.variant.ground_truth,
    );

    debug!(
        variant = %spec.variant,
        repetition = spec.repetition,
        seed = spec.seed,
        accuracy = card.detection_accuracy,
        graph_size = structure.size(),
        "Repetition complete"
    );

    let modeled = spec.variant.ground_truth;
    Ok(RepetitionRecord {
        variant: spec.variant,
        strategy: detector.strategy(),
        sizes: spec.sizes,
        repetition: spec.repetition,
        seed: spec.seed,
        detection_accuracy: card.detection_accuracy,
        path_complexity: detection.path_complexity,
        traversal_count: detection.traversal_count,
        generation_elapsed,
        build_elapsed,
        detection_elapsed,
        node_count: structure.node_count(),
        edge_count: structure.edge_count(),
        graph_size: structure.size(),
        detected_count: detection.detected_count(),
        ground_truth_count: ground_truth.len(),
        true_positives: modeled.then_some(card.true_positives.len()),
        false_positives: modeled.then_some(card.false_positives.len()),
        false_negatives: modeled.then_some(card.false_negatives.len()),
        false_positive_rate: modeled.then_some(card.false_positive_rate),
        false_negative_rate: modeled.then_some(card.false_negative_rate),
        warnings: card.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{ModelKind, StructureKind};

    fn abac_spec(gt: bool) -> RepetitionSpec {
        RepetitionSpec::new(
            VariantConfig::new(ModelKind::Abac, StructureKind::Graph, gt),
            PopulationSizes::abac(100, 20, 30),
            0,
            42,
        )
    }

    #[test]
    fn test_derive_seed_spreads_streams() {
        assert_ne!(derive_seed(1, 0), derive_seed(1, 1));
        assert_ne!(derive_seed(1, 0), derive_seed(2, 0));
        assert_eq!(derive_seed(7, 3), derive_seed(7, 3));
    }

    #[test]
    fn test_abac_record_without_ground_truth() {
        let record = run_repetition(&abac_spec(false)).unwrap();
        assert_eq!(record.node_count, 150);
        assert_eq!(record.graph_size, record.node_count + record.edge_count);
        assert_eq!(record.strategy, Strategy::PassRoleChain);
        assert!(record.false_positives.is_none());
        assert!(record.false_negative_rate.is_none());
        assert_eq!(record.ground_truth_count, 0);
    }

    #[test]
    fn test_abac_ground_truth_fully_detected() {
        let record = run_repetition(&abac_spec(true)).unwrap();
        assert_eq!(record.false_negatives, Some(0));
        assert_eq!(record.false_negative_rate, Some(0.0));
        assert!(record.ground_truth_count >= 1);
        assert!(record.detected_count >= record.ground_truth_count);
    }

    #[test]
    fn test_same_seed_same_record() {
        let spec = RepetitionSpec::new(
            VariantConfig::new(ModelKind::Ngac, StructureKind::Hypergraph, true),
            PopulationSizes::ngac(50, 0, 10, 0, 5),
            3,
            7,
        );
        let a = run_repetition(&spec).unwrap();
        let b = run_repetition(&spec).unwrap();
        assert_eq!(a.graph_size, b.graph_size);
        assert_eq!(a.traversal_count, b.traversal_count);
        assert_eq!(a.detected_count, b.detected_count);
        assert_eq!(a.false_positives, b.false_positives);
    }

    #[test]
    fn test_unsupported_variant_fails() {
        let spec = RepetitionSpec::new(
            VariantConfig::new(ModelKind::Abac, StructureKind::Hypergraph, false),
            PopulationSizes::abac(10, 2, 2),
            0,
            1,
        );
        let err = run_repetition(&spec).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_VARIANT");
    }

    #[test]
    fn test_record_json_round_trip() {
        let record = run_repetition(&abac_spec(true)).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let back: RepetitionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.variant, record.variant);
        assert_eq!(back.sizes, record.sizes);
        assert_eq!(back.graph_size, record.graph_size);
        assert_eq!(back.build_elapsed, record.build_elapsed);
        assert_eq!(back.false_negatives, record.false_negatives);
        assert!(json.contains("\"strategy\":\"pass_role_chain\""));
    }

    #[test]
    fn test_zero_principal_hypergraph_accuracy() {
        let spec = RepetitionSpec::new(
            VariantConfig::new(ModelKind::Ngac, StructureKind::Hypergraph, false),
            PopulationSizes::ngac(0, 0, 5, 0, 3),
            0,
            1,
        );
        let record = run_repetition(&spec).unwrap();
        assert!(record.detected_count > 0);
        assert_eq!(record.detection_accuracy, record.detected_count as f64);
        assert!(record.warnings.contains(&ScoreWarning::EmptyPopulation));
    }
}
