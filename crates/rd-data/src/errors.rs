use rd_types::RiskError;
use thiserror::Error;

/// Errors raised while loading or preparing price history.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Data source not found: {0}")]
    SourceNotFound(String),

    #[error("Symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("No price history for {symbol} over {period}")]
    NoData { symbol: String, period: String },

    #[error("Data parsing error: {message}")]
    ParseError { message: String },

    #[error("Invalid history period: {0}")]
    InvalidPeriod(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Return series error: {0}")]
    Series(#[from] RiskError),
}

impl DataError {
    pub fn parse(message: impl Into<String>) -> Self {
        DataError::ParseError {
            message: message.into(),
        }
    }
}

/// Result type alias for data operations
pub type DataResult<T> = Result<T, DataError>;
