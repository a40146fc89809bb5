//! Policy Graph Library
//!
//! Synthetic access-control policy models and privilege-escalation detection:
//! - Seeded ABAC and NGAC population generation with optional ground-truth chains
//! - Construction into a directed graph or a hypergraph
//! - Three detection strategies (pass-role chain, policy-class reachability,
//!   hyperedge membership)
//! - Scoring against ground truth and one-call repetitions producing result rows
//!
//! # Usage
//!
//! ```no_run
//! use policy_graph::{run_repetition, ModelKind, PopulationSizes, RepetitionSpec, StructureKind, VariantConfig};
//!
//! let variant = VariantConfig::new(ModelKind::Abac, StructureKind::Graph, true);
//! let spec = RepetitionSpec::new(variant, PopulationSizes::abac(100, 20, 30), 0, 42);
//! let record = run_repetition(&spec)?;
//! println!("accuracy {:.3}", record.detection_accuracy);
//! # Ok::<(), policy_graph::ModelError>(())
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod detector;
pub mod error;
pub mod model;
pub mod run;
pub mod scorer;
pub mod structure;
pub mod variant;

pub use detector::{Detection, Detector, DetectorOptions, EscalationMap, Evidence, Strategy};
pub use error::{ModelError, ModelResult};
pub use model::{GeneratorOptions, GroundTruth, ModelGenerator, Population};
pub use run::{derive_seed, run_repetition, RepetitionRecord, RepetitionSpec};
pub use scorer::{ScoreWarning, Scorecard};
pub use structure::{Hypergraph, PolicyGraph, PolicyStructure, StructureBuilder};
pub use variant::{ModelKind, PopulationSizes, StructureKind, VariantConfig};
