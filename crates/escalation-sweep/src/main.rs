use anyhow::{Context, Result};
use clap::Parser;
use escalation_sweep::{run_sweep, write_outputs, SweepConfig};
use policy_graph::{ModelKind, StructureKind};
use std::path::PathBuf;
use tracing::{info, warn};

/// Command-line arguments; each flag overrides the config file and environment
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML sweep config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Policy model (abac, ngac)
    #[arg(long)]
    model: Option<ModelKind>,

    /// Structure kind (graph, hypergraph)
    #[arg(long)]
    structure: Option<StructureKind>,

    /// Inject ground-truth escalation chains
    #[arg(long, default_value_t = false)]
    ground_truth: bool,

    /// Repetitions per entry (overrides ESCALATION_SWEEP_REPETITIONS)
    #[arg(long)]
    repetitions: Option<u32>,

    /// Base seed (overrides ESCALATION_SWEEP_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Concurrent repetitions (overrides ESCALATION_SWEEP_CONCURRENCY)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Output directory (overrides ESCALATION_SWEEP_OUTPUT_DIR)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Hypergraph detector scans principals only
    #[arg(long, default_value_t = false)]
    no_resource_scan: bool,
}

impl Args {
    fn into_config(self) -> Result<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => SweepConfig::from_file(path)
                .with_context(|| format!("Failed to load sweep config {}", path.display()))?,
            None => SweepConfig::default(),
        };
        config
            .apply_env()
            .context("Invalid ESCALATION_SWEEP_* environment override")?;

        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(structure) = self.structure {
            config.structure = structure;
        }
        if self.ground_truth {
            config.ground_truth = true;
        }
        if let Some(n) = self.repetitions {
            config.repetitions = n;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if self.no_resource_scan {
            config.scan_resources = false;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config()?;
    let outcome = run_sweep(&config).await.context("Sweep failed")?;
    let outputs = write_outputs(&outcome, &config.output_dir).context("Failed to write sweep outputs")?;

    if !outcome.is_clean() {
        warn!(failures = outcome.failures.len(), "Sweep finished with failed repetitions");
    }
    info!(
        rows = %outputs.rows.display(),
        snapshot = %outputs.snapshot.display(),
        summary = %outputs.summary.display(),
        "Sweep outputs written"
    );
    Ok(())
}
