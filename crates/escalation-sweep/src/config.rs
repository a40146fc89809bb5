//! Sweep configuration
//!
//! Resolution order: built-in defaults, then a TOML file, then
//! `ESCALATION_SWEEP_*` environment variables, then CLI flags (applied by the
//! binary).
//!
//! ```toml
//! model = "ngac"
//! structure = "hypergraph"
//! ground_truth = true
//! repetitions = 5
//! seed = 42
//!
//! [[entries]]
//! principals = 100
//! user_attributes = 40
//! resources = 40
//! resource_attributes = 6
//! permissions = 10
//! repetitions = 2
//! ```

use crate::error::{SweepError, SweepResult};
use policy_graph::{ModelKind, PopulationSizes, StructureKind, VariantConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_SEED: &str = "ESCALATION_SWEEP_SEED";
pub const ENV_REPETITIONS: &str = "ESCALATION_SWEEP_REPETITIONS";
pub const ENV_CONCURRENCY: &str = "ESCALATION_SWEEP_CONCURRENCY";
pub const ENV_OUTPUT_DIR: &str = "ESCALATION_SWEEP_OUTPUT_DIR";

/// One row of the parameter sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    #[serde(flatten)]
    pub sizes: PopulationSizes,
    /// Overrides the sweep-wide repetition count for this entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<u32>,
}

impl SweepEntry {
    pub fn new(sizes: PopulationSizes) -> Self {
        Self {
            sizes,
            repetitions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub model: ModelKind,
    pub structure: StructureKind,
    pub ground_truth: bool,
    /// Repetitions per entry
    pub repetitions: u32,
    /// Base seed; drawn at random and logged when unset
    pub seed: Option<u64>,
    /// Repetitions running at once
    pub concurrency: usize,
    pub output_dir: PathBuf,
    /// Probability of an NGAC principal receiving a ground-truth link
    pub ground_truth_rate: f64,
    /// Hypergraph detector also scans resources
    pub scan_resources: bool,
    /// Empty means the built-in table for the variant
    pub entries: Vec<SweepEntry>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Abac,
            structure: StructureKind::Graph,
            ground_truth: false,
            repetitions: 10,
            seed: None,
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            output_dir: PathBuf::from("sweep-results"),
            ground_truth_rate: 0.3,
            scan_resources: true,
            entries: Vec::new(),
        }
    }
}

impl SweepConfig {
    pub fn for_variant(variant: VariantConfig) -> Self {
        Self {
            model: variant.model,
            structure: variant.structure,
            ground_truth: variant.ground_truth,
            ..Self::default()
        }
    }

    pub fn variant(&self) -> VariantConfig {
        VariantConfig::new(self.model, self.structure, self.ground_truth)
    }

    pub fn from_toml_str(content: &str) -> SweepResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> SweepResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SweepError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Apply `ESCALATION_SWEEP_*` overrides from the process environment
    pub fn apply_env(&mut self) -> SweepResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Unparseable values are errors rather
    /// than silently ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> SweepResult<()> {
        if let Some(raw) = lookup(ENV_SEED) {
            self.seed = Some(parse_var(ENV_SEED, &raw)?);
        }
        if let Some(raw) = lookup(ENV_REPETITIONS) {
            self.repetitions = parse_var(ENV_REPETITIONS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CONCURRENCY) {
            self.concurrency = parse_var(ENV_CONCURRENCY, &raw)?;
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> SweepResult<()> {
        self.variant().validate()?;
        if self.concurrency == 0 {
            return Err(SweepError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.ground_truth_rate) {
            return Err(SweepError::InvalidConfig(format!(
                "ground_truth_rate must be within [0, 1], got {}",
                self.ground_truth_rate
            )));
        }
        Ok(())
    }

    /// Configured entries, or the built-in table for the variant
    pub fn resolved_entries(&self) -> Vec<SweepEntry> {
        if self.entries.is_empty() {
            default_entries(self.variant())
        } else {
            self.entries.clone()
        }
    }

    /// Total repetitions across all entries
    pub fn total_repetitions(&self) -> usize {
        self.resolved_entries()
            .iter()
            .map(|e| e.repetitions.unwrap_or(self.repetitions) as usize)
            .sum()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> SweepResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| SweepError::InvalidConfig(format!("{key}={raw:?}: {e}")))
}

/// Log-spaced size tables, one per model/structure
pub fn default_entries(variant: VariantConfig) -> Vec<SweepEntry> {
    match (variant.model, variant.structure) {
        (ModelKind::Abac, _) => [
            (100, 20, 30),
            (200, 40, 60),
            (400, 80, 120),
            (600, 100, 180),
            (800, 160, 240),
            (1000, 200, 300),
            (2000, 400, 600),
        ]
        .into_iter()
        .map(|(p, r, res)| SweepEntry::new(PopulationSizes::abac(p, r, res)))
        .collect(),
        (ModelKind::Ngac, StructureKind::Graph) => [
            (100, 20, 30, 30, 6),
            (200, 40, 60, 60, 6),
            (400, 80, 120, 120, 6),
            (600, 100, 140, 140, 6),
            (800, 160, 240, 240, 6),
            (1000, 200, 300, 300, 6),
            (2000, 400, 600, 600, 6),
        ]
        .into_iter()
        .map(|(p, ua, res, ra, perms)| SweepEntry::new(PopulationSizes::ngac(p, ua, res, ra, perms)))
        .collect(),
        (ModelKind::Ngac, StructureKind::Hypergraph) => [
            (100, 40, 40, 6, 10),
            (200, 60, 60, 8, 15),
            (400, 80, 80, 10, 20),
            (600, 100, 100, 12, 25),
            (800, 120, 120, 14, 30),
            (1000, 140, 140, 16, 35),
            (1500, 200, 200, 20, 50),
            (2000, 240, 240, 32, 70),
        ]
        .into_iter()
        .map(|(p, ua, res, ra, perms)| SweepEntry::new(PopulationSizes::ngac(p, ua, res, ra, perms)))
        .collect(),
    }
}
