//! Scoring detected escalations against injected ground truth
//!
//! Comparison is by key only: a principal counts as a true positive when it was
//! both detected and injected, regardless of which chain was found for it. Every
//! rate divides by at least 1, so empty inputs yield zeros rather than faults.

use crate::detector::EscalationMap;
use crate::model::generator::GroundTruth;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Degenerate input noticed while scoring; never an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreWarning {
    /// No principals were generated; accuracy is 0
    EmptyPopulation,
    /// Ground truth was requested but nothing was injected; FNR is 0
    EmptyGroundTruth,
}

impl std::fmt::Display for ScoreWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPopulation => write!(f, "empty population"),
            Self::EmptyGroundTruth => write!(f, "empty ground truth"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub true_positives: BTreeSet<String>,
    pub false_positives: BTreeSet<String>,
    pub false_negatives: BTreeSet<String>,
    /// Detected entries over principal count
    pub detection_accuracy: f64,
    /// FP / (FP + TP)
    pub false_positive_rate: f64,
    /// FN / |ground truth|
    pub false_negative_rate: f64,
    pub warnings: Vec<ScoreWarning>,
}

impl Scorecard {
    /// Score `detected` against `ground_truth`.
    ///
    /// `ground_truth_requested` only controls whether an empty ground-truth map is
    /// worth a warning.
    pub fn compute(
        detected: &EscalationMap,
        ground_truth: &GroundTruth,
        principal_count: usize,
        ground_truth_requested: bool,
    ) -> Self {
        let true_positives: BTreeSet<String> = detected
            .keys()
            .filter(|k| ground_truth.contains_key(*k))
            .cloned()
            .collect();
        let false_positives: BTreeSet<String> = detected
            .keys()
            .filter(|k| !ground_truth.contains_key(*k))
            .cloned()
            .collect();
        let false_negatives: BTreeSet<String> = ground_truth
            .keys()
            .filter(|k| !detected.contains_key(*k))
            .cloned()
            .collect();

        let mut warnings = Vec::new();
        if principal_count == 0 {
            warn!("Scoring an empty population; detection accuracy divides by 1");
            warnings.push(ScoreWarning::EmptyPopulation);
        }
        if ground_truth_requested && ground_truth.is_empty() {
            warn!("Ground truth requested but none injected; false-negative rate is 0");
            warnings.push(ScoreWarning::EmptyGroundTruth);
        }

        let detection_accuracy = guarded_ratio(detected.len(), principal_count);
        let false_positive_rate =
            guarded_ratio(false_positives.len(), false_positives.len() + true_positives.len());
        let false_negative_rate = guarded_ratio(false_negatives.len(), ground_truth.len());

        Self {
            true_positives,
            false_positives,
            false_negatives,
            detection_accuracy,
            false_positive_rate,
            false_negative_rate,
            warnings,
        }
    }
}

fn guarded_ratio(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator.max(1) as f64
}
