//! Sweep driver: concurrent fan-out of repetitions
//!
//! Every (entry, repetition) pair becomes one `spawn_blocking` job inside a
//! `JoinSet`, gated by a semaphore sized from `SweepConfig::concurrency`. A
//! repetition that fails (or panics) is recorded as a [`RepetitionFailure`] and
//! the sweep carries on. Rows are sorted by (entry, repetition) after join, so
//! the outcome does not depend on completion order.

use crate::config::SweepConfig;
use crate::error::{SweepError, SweepResult};
use chrono::{DateTime, Utc};
use policy_graph::{
    derive_seed, run_repetition, DetectorOptions, GeneratorOptions, ModelResult,
    RepetitionRecord, RepetitionSpec, VariantConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

/// One successful repetition, tagged with its sweep entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub entry: usize,
    #[serde(flatten)]
    pub record: RepetitionRecord,
}

/// A repetition that did not produce a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepetitionFailure {
    pub entry: usize,
    pub repetition: u32,
    pub seed: u64,
    /// `ModelError::code()`, or `PANICKED`
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub variant: VariantConfig,
    pub base_seed: u64,
    pub rows: Vec<SweepRow>,
    pub failures: Vec<RepetitionFailure>,
}

impl SweepOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Seed for one repetition: entry index in the high half, repetition in the low
pub fn repetition_seed(base_seed: u64, entry: usize, repetition: u32) -> u64 {
    derive_seed(base_seed, ((entry as u64) << 32) | u64::from(repetition))
}

type JobOutput = (usize, u32, u64, Result<ModelResult<RepetitionRecord>, String>);

/// Run every repetition of every entry
pub async fn run_sweep(config: &SweepConfig) -> SweepResult<SweepOutcome> {
    run_sweep_with(config, run_repetition).await
}

/// [`run_sweep`] with a caller-supplied repetition runner
pub async fn run_sweep_with<F>(config: &SweepConfig, runner: F) -> SweepResult<SweepOutcome>
where
    F: Fn(&RepetitionSpec) -> ModelResult<RepetitionRecord> + Send + Sync + 'static,
{
    config.validate()?;

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let variant = config.variant();
    let base_seed = config.seed.unwrap_or_else(rand::random);
    let entries = config.resolved_entries();

    info!(
        %run_id,
        %variant,
        base_seed,
        entries = entries.len(),
        repetitions = config.total_repetitions(),
        concurrency = config.concurrency,
        "Starting sweep"
    );

    let generator = GeneratorOptions {
        ground_truth_rate: config.ground_truth_rate,
        ..GeneratorOptions::default()
    };
    let detector = DetectorOptions {
        scan_resources: config.scan_resources,
    };

    let runner = Arc::new(runner);
    let sem = Arc::new(Semaphore::new(config.concurrency));
    let mut join_set: JoinSet<JobOutput> = JoinSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let repetitions = entry.repetitions.unwrap_or(config.repetitions);
        info!(entry = index, sizes = ?entry.sizes, repetitions, "Queueing entry");

        for repetition in 0..repetitions {
            let seed = repetition_seed(base_seed, index, repetition);
            let spec = RepetitionSpec::new(variant, entry.sizes, repetition, seed)
                .with_generator_options(generator)
                .with_detector_options(detector);
            let sem = sem.clone();
            let runner = runner.clone();

            join_set.spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return (index, repetition, seed, Err(e.to_string())),
                };
                let result = tokio::task::spawn_blocking(move || runner(&spec))
                    .await
                    .map_err(|e| e.to_string());
                (index, repetition, seed, result)
            });
        }
    }

    let mut rows = Vec::new();
    let mut failures = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        let (entry, repetition, seed, result) =
            joined.map_err(|e| SweepError::Task(e.to_string()))?;
        match result {
            Ok(Ok(record)) => rows.push(SweepRow { entry, record }),
            Ok(Err(e)) => {
                warn!(entry, repetition, seed, code = e.code(), "Repetition failed: {e}");
                failures.push(RepetitionFailure {
                    entry,
                    repetition,
                    seed,
                    code: e.code().to_string(),
                    message: e.to_string(),
                });
            }
            Err(message) => {
                warn!(entry, repetition, seed, "Repetition panicked: {message}");
                failures.push(RepetitionFailure {
                    entry,
                    repetition,
                    seed,
                    code: "PANICKED".to_string(),
                    message,
                });
            }
        }
    }

    rows.sort_by_key(|row| (row.entry, row.record.repetition));
    failures.sort_by_key(|f| (f.entry, f.repetition));

    let finished_at = Utc::now();
    info!(
        %run_id,
        rows = rows.len(),
        failures = failures.len(),
        elapsed_ms = (finished_at - started_at).num_milliseconds(),
        "Sweep complete"
    );

    Ok(SweepOutcome {
        run_id,
        started_at,
        finished_at,
        variant,
        base_seed,
        rows,
        failures,
    })
}
