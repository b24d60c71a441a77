use thiserror::Error;

/// Error type shared by every risk estimator.
///
/// All variants except [`RiskError::ConfigurationInvalid`] describe a data
/// condition: the metric simply cannot be computed from the input it was
/// given. Configuration errors are programmer errors and abort the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("No data available: {message}")]
    DataUnavailable { message: String },

    #[error("Insufficient data: {message}")]
    InsufficientData { message: String },

    #[error("Insufficient overlapping observations: required {required}, found {actual}")]
    InsufficientOverlap { required: usize, actual: usize },

    #[error("Degenerate denominator while computing {metric}: {message}")]
    DivisionDegenerate { metric: String, message: String },

    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

impl RiskError {
    /// `true` for errors that mean "could not compute from this data".
    pub fn is_data_condition(&self) -> bool {
        !matches!(self, RiskError::ConfigurationInvalid(_))
    }

    pub fn data_unavailable(message: impl Into<String>) -> Self {
        RiskError::DataUnavailable {
            message: message.into(),
        }
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        RiskError::InsufficientData {
            message: message.into(),
        }
    }

    pub fn degenerate(metric: impl Into<String>, message: impl Into<String>) -> Self {
        RiskError::DivisionDegenerate {
            metric: metric.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for risk computations
pub type RiskResult<T> = Result<T, RiskError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::RiskError::ConfigurationInvalid(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = RiskError::InsufficientOverlap {
            required: 20,
            actual: 7,
        };

        assert!(error.to_string().contains("required 20"));
        assert!(error.to_string().contains("found 7"));
    }

    #[test]
    fn test_data_condition_classification() {
        assert!(RiskError::data_unavailable("empty").is_data_condition());
        assert!(RiskError::insufficient_data("one point").is_data_condition());
        assert!(RiskError::degenerate("sharpe", "zero volatility").is_data_condition());
        assert!(!config_error!("confidence {} outside (0, 1)", 1.5).is_data_condition());
    }

    #[test]
    fn test_config_macro() {
        let err = config_error!("portfolio value must be positive, got {}", -1);
        assert_eq!(
            err,
            RiskError::ConfigurationInvalid("portfolio value must be positive, got -1".into())
        );
    }
}
