//! Sweep driver errors

use policy_graph::ModelError;
use std::path::PathBuf;
use thiserror::Error;

pub type SweepResult<T> = Result<T, SweepError>;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse sweep config: {0}")]
    ParseConfig(#[from] toml::de::Error),

    #[error("Failed to serialize sweep output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid sweep config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Sweep task failed: {0}")]
    Task(String),
}

impl SweepError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
