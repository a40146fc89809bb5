//! Parameter-sweep driver for the escalation-detection benchmark.
//!
//! Loads a [`SweepConfig`], runs every repetition of every entry concurrently on
//! the blocking pool, and persists rows, a snapshot and a Markdown summary.

pub mod config;
pub mod driver;
pub mod error;
pub mod report;
pub mod sink;

pub use config::{default_entries, SweepConfig, SweepEntry};
pub use driver::{
    repetition_seed, run_sweep, run_sweep_with, RepetitionFailure, SweepOutcome, SweepRow,
};
pub use error::{SweepError, SweepResult};
pub use report::{format_summary, summarize, EntrySummary};
pub use sink::{append_rows, read_rows, write_outputs, WrittenOutputs};
