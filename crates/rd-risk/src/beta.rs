//! Market beta against a benchmark return series.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use rd_types::{ReturnSeries, RiskError, RiskResult, TimeIndex};

use crate::stats::{inner_join, pearson, sample_covariance, sample_variance};

/// Minimum number of shared timestamps for a meaningful beta.
pub const MIN_BETA_OVERLAP: usize = 20;

/// Beta bucket, from most to least market-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetaClass {
    HighlyAggressive,
    Aggressive,
    Moderate,
    Defensive,
    VeryDefensive,
    Inverse,
}

impl BetaClass {
    pub fn from_beta(beta: f64) -> Self {
        if beta > 1.5 {
            BetaClass::HighlyAggressive
        } else if beta > 1.2 {
            BetaClass::Aggressive
        } else if beta > 0.8 {
            BetaClass::Moderate
        } else if beta > 0.5 {
            BetaClass::Defensive
        } else if beta > 0.0 {
            BetaClass::VeryDefensive
        } else {
            BetaClass::Inverse
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BetaClass::HighlyAggressive => "very volatile relative to the market",
            BetaClass::Aggressive => "more volatile than the market",
            BetaClass::Moderate => "similar to the market",
            BetaClass::Defensive => "less volatile than the market",
            BetaClass::VeryDefensive => "low market sensitivity",
            BetaClass::Inverse => "moves opposite to the market",
        }
    }
}

impl fmt::Display for BetaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BetaClass::HighlyAggressive => "Highly Aggressive",
            BetaClass::Aggressive => "Aggressive",
            BetaClass::Moderate => "Moderate",
            BetaClass::Defensive => "Defensive",
            BetaClass::VeryDefensive => "Very Defensive",
            BetaClass::Inverse => "Inverse",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetaResult {
    pub beta: f64,
    /// `None` when the asset is flat over the overlap.
    pub r_squared: Option<f64>,
    pub correlation: Option<f64>,
    /// Symbol of the benchmark series.
    pub benchmark_id: String,
    pub classification: BetaClass,
    /// Number of timestamps shared by asset and benchmark.
    pub observations: usize,
}

impl BetaResult {
    pub fn interpretation(&self) -> String {
        let head = format!(
            "Beta: {:.2} - {} ({})",
            self.beta,
            self.classification,
            self.classification.description()
        );
        match self.r_squared {
            Some(r2) => format!("{head}. R²: {:.2}% (explained variance)", r2 * 100.0),
            None => format!("{head}. R²: n/a (flat asset)"),
        }
    }
}

/// `Cov(asset, benchmark) / Var(benchmark)` over the timestamps both series
/// share. Fewer than `min_overlap` shared points fails with
/// `InsufficientOverlap`; a flat benchmark is `DivisionDegenerate`. A flat
/// asset has beta 0 and no correlation.
pub fn compute_beta<I: TimeIndex>(
    series: &ReturnSeries<I>,
    benchmark: &ReturnSeries<I>,
    min_overlap: usize,
) -> RiskResult<BetaResult> {
    series.ensure_not_empty()?;
    benchmark.ensure_not_empty()?;

    let (asset, market) = inner_join(series, benchmark);
    let required = min_overlap.max(2);
    if asset.len() < required {
        return Err(RiskError::InsufficientOverlap {
            required,
            actual: asset.len(),
        });
    }

    let covariance = sample_covariance(&asset, &market).unwrap_or_default();
    let market_variance = sample_variance(&market).unwrap_or_default();
    if market_variance <= f64::EPSILON * f64::EPSILON {
        return Err(RiskError::degenerate(
            "beta",
            format!("benchmark {} has zero variance", benchmark.symbol()),
        ));
    }
    let correlation = pearson(&asset, &market);

    let beta = covariance / market_variance;
    debug!(
        symbol = series.symbol(),
        benchmark = benchmark.symbol(),
        beta,
        observations = asset.len(),
        "computed beta"
    );

    Ok(BetaResult {
        beta,
        r_squared: correlation.map(|r| r * r),
        correlation,
        benchmark_id: benchmark.symbol().to_string(),
        classification: BetaClass::from_beta(beta),
        observations: asset.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| ((i * 7 % 11) as f64 - 5.0) / 400.0)
            .collect()
    }

    #[test]
    fn scaled_series_has_exact_beta() {
        let m = market(60);
        let asset: Vec<f64> = m.iter().map(|r| 1.4 * r).collect();
        let bench = ReturnSeries::from_values("SPY", &m).unwrap();
        let series = ReturnSeries::from_values("TSLA", &asset).unwrap();

        let result = compute_beta(&series, &bench, MIN_BETA_OVERLAP).unwrap();
        assert!((result.beta - 1.4).abs() < 1e-9);
        assert!((result.correlation.unwrap() - 1.0).abs() < 1e-9);
        assert!((result.r_squared.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(result.classification, BetaClass::Aggressive);
        assert_eq!(result.benchmark_id, "SPY");
        assert_eq!(result.observations, 60);
    }

    #[test]
    fn inverse_series() {
        let m = market(40);
        let asset: Vec<f64> = m.iter().map(|r| -0.5 * r).collect();
        let bench = ReturnSeries::from_values("SPY", &m).unwrap();
        let series = ReturnSeries::from_values("SH", &asset).unwrap();

        let result = compute_beta(&series, &bench, MIN_BETA_OVERLAP).unwrap();
        assert!((result.beta + 0.5).abs() < 1e-9);
        assert_eq!(result.classification, BetaClass::Inverse);
    }

    #[test]
    fn only_shared_timestamps_are_used() {
        let m = market(60);
        let bench = ReturnSeries::from_values("SPY", &m).unwrap();
        // asset only covers the odd positions 1, 3, ..., 39
        let pairs: Vec<(usize, f64)> = (0..20).map(|k| (2 * k + 1, m[2 * k + 1] * 0.9)).collect();
        let series = ReturnSeries::from_pairs("KO", pairs).unwrap();

        let result = compute_beta(&series, &bench, MIN_BETA_OVERLAP).unwrap();
        assert_eq!(result.observations, 20);
        assert!((result.beta - 0.9).abs() < 1e-9);
    }

    #[test]
    fn insufficient_overlap_never_yields_beta() {
        let m = market(60);
        let bench = ReturnSeries::from_values("SPY", &m).unwrap();
        let pairs: Vec<(usize, f64)> = (0..19).map(|i| (i, m[i])).collect();
        let series = ReturnSeries::from_pairs("NEW", pairs).unwrap();

        let err = compute_beta(&series, &bench, MIN_BETA_OVERLAP).unwrap_err();
        assert_eq!(
            err,
            RiskError::InsufficientOverlap {
                required: 20,
                actual: 19
            }
        );
    }

    #[test]
    fn flat_benchmark_is_degenerate() {
        let bench = ReturnSeries::from_values("CASH", &[0.0; 30]).unwrap();
        let series = ReturnSeries::from_values("X", &market(30)).unwrap();
        assert!(matches!(
            compute_beta(&series, &bench, MIN_BETA_OVERLAP),
            Err(RiskError::DivisionDegenerate { .. })
        ));
    }

    #[test]
    fn flat_asset_has_zero_beta_without_correlation() {
        let bench = ReturnSeries::from_values("SPY", &market(30)).unwrap();
        let series = ReturnSeries::from_values("CASH", &[0.0; 30]).unwrap();

        let result = compute_beta(&series, &bench, MIN_BETA_OVERLAP).unwrap();
        assert_eq!(result.beta, 0.0);
        assert_eq!(result.classification, BetaClass::Inverse);
        assert!(result.correlation.is_none());
        assert!(result.r_squared.is_none());
        assert!(result.interpretation().ends_with("R²: n/a (flat asset)"));
    }

    #[test]
    fn classification_buckets() {
        assert_eq!(BetaClass::from_beta(1.6), BetaClass::HighlyAggressive);
        assert_eq!(BetaClass::from_beta(1.5), BetaClass::Aggressive);
        assert_eq!(BetaClass::from_beta(1.0), BetaClass::Moderate);
        assert_eq!(BetaClass::from_beta(0.6), BetaClass::Defensive);
        assert_eq!(BetaClass::from_beta(0.2), BetaClass::VeryDefensive);
        assert_eq!(BetaClass::from_beta(0.0), BetaClass::Inverse);
        assert_eq!(BetaClass::HighlyAggressive.to_string(), "Highly Aggressive");
    }
}
