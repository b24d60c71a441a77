use rd_data::DataError;
use rd_types::RiskError;
use thiserror::Error;

/// Errors surfaced by the engine and the CLI.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Risk error: {0}")]
    Risk(#[from] RiskError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task failed: {0}")]
    Task(String),
}

impl EngineError {
    /// `true` when the failure only means a symbol had no usable data.
    pub fn is_data_condition(&self) -> bool {
        match self {
            EngineError::Risk(e) => e.is_data_condition(),
            _ => false,
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
