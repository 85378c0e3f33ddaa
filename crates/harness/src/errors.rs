//! Simulation errors

use fileguard_content::IntegrityError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    /// A setup step failed; the run cannot produce meaningful metrics.
    #[error("setup failed while {step}: {cause}")]
    Setup { step: &'static str, cause: String },

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to write metrics to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode metrics: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SimulationError {
    pub(crate) fn setup(step: &'static str, cause: impl std::fmt::Display) -> Self {
        SimulationError::Setup {
            step,
            cause: cause.to_string(),
        }
    }
}

impl From<config::ConfigError> for SimulationError {
    fn from(err: config::ConfigError) -> Self {
        SimulationError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
