//! Result sinks
//!
//! Three outputs per sweep, all under the configured output directory:
//! - `sweep-rows.jsonl`: append-only, one JSON object per row across all runs
//! - `sweep-<run_id>.json`: pretty snapshot of the complete outcome
//! - `sweep-<run_id>.md`: Markdown summary table

use crate::driver::{SweepOutcome, SweepRow};
use crate::error::{SweepError, SweepResult};
use crate::report::format_summary;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const ROWS_FILE: &str = "sweep-rows.jsonl";

/// Paths written by [`write_outputs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenOutputs {
    pub rows: PathBuf,
    pub snapshot: PathBuf,
    pub summary: PathBuf,
}

/// Append rows to a JSONL file, creating it if needed
pub fn append_rows(rows: &[SweepRow], path: &Path) -> SweepResult<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SweepError::io(path, e))?;
    for row in rows {
        let json = serde_json::to_string(row)?;
        writeln!(file, "{json}").map_err(|e| SweepError::io(path, e))?;
    }
    info!(path = %path.display(), rows = rows.len(), "Appended sweep rows");
    Ok(())
}

/// Read rows back from a JSONL file, skipping blank lines
pub fn read_rows(path: &Path) -> SweepResult<Vec<SweepRow>> {
    let content = std::fs::read_to_string(path).map_err(|e| SweepError::io(path, e))?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(SweepError::from))
        .collect()
}

pub fn write_snapshot(outcome: &SweepOutcome, path: &Path) -> SweepResult<()> {
    let json = serde_json::to_string_pretty(outcome)?;
    std::fs::write(path, json).map_err(|e| SweepError::io(path, e))?;
    info!(path = %path.display(), "Wrote sweep snapshot");
    Ok(())
}

pub fn write_summary(outcome: &SweepOutcome, path: &Path) -> SweepResult<()> {
    std::fs::write(path, format_summary(outcome)).map_err(|e| SweepError::io(path, e))?;
    info!(path = %path.display(), "Wrote sweep summary");
    Ok(())
}

/// Write all three outputs into `dir`, creating it if needed
pub fn write_outputs(outcome: &SweepOutcome, dir: &Path) -> SweepResult<WrittenOutputs> {
    std::fs::create_dir_all(dir).map_err(|e| SweepError::io(dir, e))?;

    let outputs = WrittenOutputs {
        rows: dir.join(ROWS_FILE),
        snapshot: dir.join(format!("sweep-{}.json", outcome.run_id)),
        summary: dir.join(format!("sweep-{}.md", outcome.run_id)),
    };
    append_rows(&outcome.rows, &outputs.rows)?;
    write_snapshot(outcome, &outputs.snapshot)?;
    write_summary(outcome, &outputs.summary)?;
    Ok(outputs)
}
