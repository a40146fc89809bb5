//! Escalation detection
//!
//! Three strategies, one per structure shape:
//!
//! - [`pattern`]: the fixed 3-hop pass-role chain over an ABAC graph
//! - [`reachability`]: unbounded policy-class reachability over an NGAC graph
//! - [`membership`]: policy-class co-membership over a hypergraph
//!
//! [`Detector`] selects the strategy for a variant and dispatches on the built
//! structure. The traversal counter is part of the returned [`Detection`], so a
//! detector holds no state between calls.

pub mod membership;
pub mod pattern;
pub mod reachability;

use crate::error::{ModelError, ModelResult};
use crate::model::types::NodeKind;
use crate::structure::builder::PolicyStructure;
use crate::variant::{ModelKind, StructureKind, VariantConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Detection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PassRoleChain,
    PolicyClassReachability,
    HyperedgeMembership,
}

impl Strategy {
    /// Strategy for a model/structure combination
    pub fn for_variant(variant: &VariantConfig) -> ModelResult<Self> {
        variant.validate()?;
        Ok(match (variant.model, variant.structure) {
            (ModelKind::Abac, StructureKind::Graph) => Self::PassRoleChain,
            (ModelKind::Ngac, StructureKind::Graph) => Self::PolicyClassReachability,
            (_, StructureKind::Hypergraph) => Self::HyperedgeMembership,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PassRoleChain => "pass_role_chain",
            Self::PolicyClassReachability => "policy_class_reachability",
            Self::HyperedgeMembership => "hyperedge_membership",
        }
    }

    /// Structure kind this strategy traverses
    pub fn structure(&self) -> StructureKind {
        match self {
            Self::PassRoleChain | Self::PolicyClassReachability => StructureKind::Graph,
            Self::HyperedgeMembership => StructureKind::Hypergraph,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a principal (or resource) was flagged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    /// Labels after the flagged node, in path order
    Chain { hops: Vec<String> },
    /// The incident hyperedge that contains a policy class
    Hyperedge { key: String, members: Vec<String> },
}

impl Evidence {
    /// Hop count of a chain; a shared hyperedge counts as one hop
    pub fn path_length(&self) -> usize {
        match self {
            Self::Chain { hops } => hops.len(),
            Self::Hyperedge { .. } => 1,
        }
    }
}

/// Flagged label → first evidence found for it
pub type EscalationMap = BTreeMap<String, Evidence>;

/// Result of one detection pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub escalations: EscalationMap,
    /// Exploratory and matching steps taken; a relative cost proxy
    pub traversal_count: u64,
    /// Mean evidence path length over flagged entries, 0 when none
    pub path_complexity: f64,
}

impl Detection {
    pub(crate) fn new(escalations: EscalationMap, traversal_count: u64) -> Self {
        let path_complexity = if escalations.is_empty() {
            0.0
        } else {
            let total: usize = escalations.values().map(Evidence::path_length).sum();
            total as f64 / escalations.len() as f64
        };
        Self {
            escalations,
            traversal_count,
            path_complexity,
        }
    }

    pub fn detected_count(&self) -> usize {
        self.escalations.len()
    }

    pub fn is_flagged(&self, label: &str) -> bool {
        self.escalations.contains_key(label)
    }
}

/// Detector options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorOptions {
    /// Hypergraph strategy: also scan resource nodes for policy-class membership
    pub scan_resources: bool,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            scan_resources: true,
        }
    }
}

/// A detection strategy plus its options
#[derive(Debug, Clone, Copy)]
pub struct Detector {
    strategy: Strategy,
    options: DetectorOptions,
}

impl Detector {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            options: DetectorOptions::default(),
        }
    }

    pub fn for_variant(variant: &VariantConfig) -> ModelResult<Self> {
        Ok(Self::new(Strategy::for_variant(variant)?))
    }

    pub fn with_options(mut self, options: DetectorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Run the strategy over a built structure
    pub fn detect(&self, structure: &PolicyStructure) -> ModelResult<Detection> {
        let detection = match (self.strategy, structure) {
            (Strategy::PassRoleChain, PolicyStructure::Graph(graph)) => {
                pattern::detect_pass_role_chains(graph)
            }
            (Strategy::PolicyClassReachability, PolicyStructure::Graph(graph)) => {
                reachability::detect_policy_class_reachability(graph)
            }
            (Strategy::HyperedgeMembership, PolicyStructure::Hypergraph(hypergraph)) => {
                let mut scanned = vec![NodeKind::Principal];
                if self.options.scan_resources {
                    scanned.push(NodeKind::Resource);
                }
                membership::detect_policy_class_membership(hypergraph, &scanned)
            }
            (strategy, other) => {
                return Err(ModelError::StructureMismatch {
                    strategy: strategy.name(),
                    structure: match other.kind() {
                        StructureKind::Graph => "graph",
                        StructureKind::Hypergraph => "hypergraph",
                    },
                })
            }
        };
        debug!(
            strategy = %self.strategy,
            detected = detection.detected_count(),
            traversals = detection.traversal_count,
            "Detection complete"
        );
        Ok(detection)
    }
}
