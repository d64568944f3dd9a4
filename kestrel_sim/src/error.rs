// kestrel_sim/src/error.rs

use kestrel_core::error::ObserverError;
use kestrel_core::types::{TimeIndex, VectorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Observer(#[from] ObserverError),

    #[error("failed to load scenario configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("failed to serialize scenario configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no {kind} recorded at k={k}")]
    MissingSample { kind: VectorKind, k: TimeIndex },

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

impl From<figment::Error> for SimError {
    fn from(e: figment::Error) -> Self {
        SimError::Config(Box::new(e))
    }
}

pub type SimResult<T> = Result<T, SimError>;
