use serde::{Deserialize, Serialize};
use std::path::Path;

use rd_data::HistoryPeriod;
use rd_risk::AssessmentConfig;
use rd_types::RiskLimits;

use crate::errors::{EngineError, EngineResult};

/// Settings for a [`RiskEngine`](crate::RiskEngine) run.
///
/// Every field has a default, so a JSON file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub history_period: HistoryPeriod,
    /// Run `clean_history` on fetched prices before building returns.
    pub clean_history: bool,
    /// Histories scoring below this are still used but logged.
    pub min_quality_score: f64,
    pub max_concurrent_fetches: usize,
    pub cache_max_entries: usize,
    pub cache_ttl_secs: Option<i64>,
    pub limits: RiskLimits,
    pub assessment: AssessmentConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_period: HistoryPeriod::OneYear,
            clean_history: true,
            min_quality_score: 80.0,
            max_concurrent_fetches: 8,
            cache_max_entries: 256,
            cache_ttl_secs: Some(300),
            limits: RiskLimits::default(),
            assessment: AssessmentConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.max_concurrent_fetches == 0 {
            return Err(EngineError::Config(
                "max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.min_quality_score) {
            return Err(EngineError::Config(format!(
                "min_quality_score must be within 0..=100, got {}",
                self.min_quality_score
            )));
        }
        if matches!(self.cache_ttl_secs, Some(ttl) if ttl < 0) {
            return Err(EngineError::Config("cache_ttl_secs must not be negative".to_string()));
        }
        self.limits.validate()?;
        self.assessment.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"history_period": "2y", "limits": {{"var95_max": 0.03}}, "assessment": {{"risk_free_rate": 0.05}}}}"#
        )
        .unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.history_period, HistoryPeriod::TwoYears);
        assert_eq!(config.limits.var95_max, 0.03);
        assert_eq!(config.limits.var99_max, RiskLimits::default().var99_max);
        assert_eq!(config.assessment.risk_free_rate, 0.05);
        assert_eq!(config.assessment.benchmark_symbol, "SPY");
        assert_eq!(config.max_concurrent_fetches, 8);
    }

    #[test]
    fn invalid_values_rejected() {
        let config = EngineConfig {
            max_concurrent_fetches: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.limits.sharpe_min = f64::NAN;
        assert!(matches!(config.validate(), Err(EngineError::Risk(_))));
    }

    #[test]
    fn unknown_period_fails_to_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"history_period": "3w"}}"#).unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(file.path()),
            Err(EngineError::Serialization(_))
        ));
    }
}
