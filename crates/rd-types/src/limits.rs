use serde::{Deserialize, Serialize};

use crate::errors::{RiskError, RiskResult};

/// Risk limits an assessment is checked against.
///
/// Maxima are breached when the observed value is strictly greater;
/// `sharpe_min` is breached when the observed Sharpe ratio is strictly lower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Max 1-day VaR at 95% confidence, as a fraction.
    pub var95_max: f64,
    /// Max 1-day VaR at 99% confidence, as a fraction.
    pub var99_max: f64,
    /// Max annualized volatility.
    pub volatility_max: f64,
    /// Max peak-to-trough drawdown.
    pub max_drawdown_max: f64,
    /// Minimum acceptable Sharpe ratio.
    pub sharpe_min: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            var95_max: 0.05,
            var99_max: 0.10,
            volatility_max: 0.30,
            max_drawdown_max: 0.20,
            sharpe_min: 1.0,
        }
    }
}

impl RiskLimits {
    pub fn validate(&self) -> RiskResult<()> {
        let maxima = [
            ("var95_max", self.var95_max),
            ("var99_max", self.var99_max),
            ("volatility_max", self.volatility_max),
            ("max_drawdown_max", self.max_drawdown_max),
        ];
        for (name, value) in maxima {
            if !value.is_finite() || value < 0.0 {
                return Err(RiskError::ConfigurationInvalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !self.sharpe_min.is_finite() {
            return Err(RiskError::ConfigurationInvalid(format!(
                "sharpe_min must be finite, got {}",
                self.sharpe_min
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let limits = RiskLimits::default();
        assert!(limits.validate().is_ok());
        assert_eq!(limits.var95_max, 0.05);
        assert_eq!(limits.sharpe_min, 1.0);
    }

    #[test]
    fn test_negative_limit_rejected() {
        let limits = RiskLimits {
            volatility_max: -0.1,
            ..RiskLimits::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(RiskError::ConfigurationInvalid(_))
        ));
    }

    #[test]
    fn test_partial_override_from_json() {
        let limits: RiskLimits = serde_json::from_str(r#"{"var95_max": 0.03}"#).unwrap();
        assert_eq!(limits.var95_max, 0.03);
        assert_eq!(limits.var99_max, RiskLimits::default().var99_max);
    }
}
