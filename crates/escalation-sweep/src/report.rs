//! Per-entry aggregation and the Markdown summary.

use crate::driver::{SweepOutcome, SweepRow};
use policy_graph::PopulationSizes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Means over the successful repetitions of one sweep entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub entry: usize,
    pub sizes: PopulationSizes,
    /// Successful repetitions aggregated.
    pub repetitions: usize,
    pub mean_accuracy: f64,
    pub mean_path_complexity: f64,
    pub mean_traversal_count: f64,
    pub mean_graph_size: f64,
    pub mean_generation: Duration,
    pub mean_build: Duration,
    pub mean_detection: Duration,
    /// Present when ground truth was modeled.
    pub mean_false_positive_rate: Option<f64>,
    pub mean_false_negative_rate: Option<f64>,
}

/// Aggregate rows by entry, in entry order.
pub fn summarize(rows: &[SweepRow]) -> Vec<EntrySummary> {
    let mut grouped: BTreeMap<usize, Vec<&SweepRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.entry).or_default().push(row);
    }
    grouped
        .into_iter()
        .map(|(entry, rows)| summarize_entry(entry, &rows))
        .collect()
}

fn summarize_entry(entry: usize, rows: &[&SweepRow]) -> EntrySummary {
    let n = rows.len();
    let mean = |f: &dyn Fn(&SweepRow) -> f64| rows.iter().map(|&r| f(r)).sum::<f64>() / n as f64;
    let mean_duration = |f: &dyn Fn(&SweepRow) -> Duration| {
        let total: Duration = rows.iter().map(|&r| f(r)).sum();
        total / n as u32
    };
    let mean_option = |f: &dyn Fn(&SweepRow) -> Option<f64>| {
        let values: Vec<f64> = rows.iter().filter_map(|&r| f(r)).collect();
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    };

    EntrySummary {
        entry,
        sizes: rows[0].record.sizes,
        repetitions: n,
        mean_accuracy: mean(&|r| r.record.detection_accuracy),
        mean_path_complexity: mean(&|r| r.record.path_complexity),
        mean_traversal_count: mean(&|r| r.record.traversal_count as f64),
        mean_graph_size: mean(&|r| r.record.graph_size as f64),
        mean_generation: mean_duration(&|r| r.record.generation_elapsed),
        mean_build: mean_duration(&|r| r.record.build_elapsed),
        mean_detection: mean_duration(&|r| r.record.detection_elapsed),
        mean_false_positive_rate: mean_option(&|r| r.record.false_positive_rate),
        mean_false_negative_rate: mean_option(&|r| r.record.false_negative_rate),
    }
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.1}%", r * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

/// Render a sweep outcome as Markdown.
pub fn format_summary(outcome: &SweepOutcome) -> String {
    let mut report = String::new();

    report.push_str(&format!("# Escalation Sweep: {}\n\n", outcome.variant));
    report.push_str(&format!(
        "Run `{}` started {} with base seed {}.\n\n",
        outcome.run_id,
        outcome.started_at.to_rfc3339(),
        outcome.base_seed
    ));

    report.push_str("| Entry | Principals | Resources | Reps | Accuracy | Path complexity | Traversals | Graph size | Gen (ms) | Build (ms) | Detect (ms) | FPR | FNR |\n");
    report.push_str("|-------|------------|-----------|------|----------|-----------------|------------|------------|----------|------------|-------------|-----|-----|\n");
    for s in summarize(&outcome.rows) {
        report.push_str(&format!(
            "| {} | {} | {} | {} | {:.1}% | {:.2} | {:.0} | {:.0} | {:.2} | {:.2} | {:.2} | {} | {} |\n",
            s.entry,
            s.sizes.principals,
            s.sizes.resources,
            s.repetitions,
            s.mean_accuracy * 100.0,
            s.mean_path_complexity,
            s.mean_traversal_count,
            s.mean_graph_size,
            s.mean_generation.as_secs_f64() * 1000.0,
            s.mean_build.as_secs_f64() * 1000.0,
            s.mean_detection.as_secs_f64() * 1000.0,
            format_rate(s.mean_false_positive_rate),
            format_rate(s.mean_false_negative_rate),
        ));
    }

    if !outcome.failures.is_empty() {
        report.push_str("\n## Failures\n\n");
        report.push_str("| Entry | Repetition | Seed | Code | Message |\n");
        report.push_str("|-------|------------|------|------|---------|\n");
        for f in &outcome.failures {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                f.entry, f.repetition, f.seed, f.code, f.message
            ));
        }
    }

    report
}
