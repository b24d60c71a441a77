use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{RiskError, RiskResult};

/// An ordered position on a return series' time axis.
///
/// Every duration the risk core reports (drawdown length, recovery length) is
/// computed through [`TimeIndex::periods_between`], so date-indexed and
/// plain-index series share one code path.
pub trait TimeIndex: Copy + Ord + fmt::Debug + fmt::Display + Send + Sync {
    /// Signed distance from `earlier` to `later`: calendar days for dates,
    /// index distance for positional series.
    fn periods_between(earlier: Self, later: Self) -> i64;
}

impl TimeIndex for DateTime<Utc> {
    fn periods_between(earlier: Self, later: Self) -> i64 {
        later.signed_duration_since(earlier).num_days()
    }
}

impl TimeIndex for NaiveDate {
    fn periods_between(earlier: Self, later: Self) -> i64 {
        later.signed_duration_since(earlier).num_days()
    }
}

impl TimeIndex for usize {
    fn periods_between(earlier: Self, later: Self) -> i64 {
        later as i64 - earlier as i64
    }
}

/// A single periodic return observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint<I = DateTime<Utc>> {
    pub timestamp: I,
    /// Fractional change over the period (0.01 = +1%).
    pub value: f64,
}

impl<I> ReturnPoint<I> {
    pub fn new(timestamp: I, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Immutable, strictly time-ordered sequence of periodic returns for one
/// symbol. The common input of every estimator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries<I = DateTime<Utc>> {
    symbol: String,
    points: Vec<ReturnPoint<I>>,
}

impl<I: TimeIndex> ReturnSeries<I> {
    /// Build a series, rejecting unordered or duplicate timestamps and
    /// non-finite returns.
    pub fn new(symbol: impl Into<String>, points: Vec<ReturnPoint<I>>) -> RiskResult<Self> {
        let symbol = symbol.into();

        for (i, point) in points.iter().enumerate() {
            if !point.value.is_finite() {
                return Err(RiskError::ConfigurationInvalid(format!(
                    "{symbol}: non-finite return {} at {}",
                    point.value, point.timestamp
                )));
            }
            if i > 0 && points[i - 1].timestamp >= point.timestamp {
                return Err(RiskError::ConfigurationInvalid(format!(
                    "{symbol}: timestamps must be strictly increasing ({} then {})",
                    points[i - 1].timestamp,
                    point.timestamp
                )));
            }
        }

        Ok(Self { symbol, points })
    }

    pub fn from_pairs(
        symbol: impl Into<String>,
        pairs: impl IntoIterator<Item = (I, f64)>,
    ) -> RiskResult<Self> {
        let points = pairs
            .into_iter()
            .map(|(timestamp, value)| ReturnPoint::new(timestamp, value))
            .collect();
        Self::new(symbol, points)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[ReturnPoint<I>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Return values in time order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn timestamp(&self, idx: usize) -> Option<I> {
        self.points.get(idx).map(|p| p.timestamp)
    }

    pub fn first_timestamp(&self) -> Option<I> {
        self.points.first().map(|p| p.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<I> {
        self.points.last().map(|p| p.timestamp)
    }

    /// Arithmetic mean return, `None` for an empty series.
    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().map(|p| p.value).sum::<f64>() / self.points.len() as f64)
    }

    /// Fail with `DataUnavailable` when the series holds no observations.
    pub fn ensure_not_empty(&self) -> RiskResult<()> {
        if self.points.is_empty() {
            return Err(RiskError::data_unavailable(format!(
                "return series for {} is empty",
                self.symbol
            )));
        }
        Ok(())
    }
}

impl ReturnSeries<usize> {
    /// Positional series indexed `0..n`, for data without timestamps.
    pub fn from_values(symbol: impl Into<String>, values: &[f64]) -> RiskResult<Self> {
        Self::from_pairs(symbol, values.iter().copied().enumerate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_positional_series() {
        let series = ReturnSeries::from_values("TEST", &[0.01, -0.02, 0.03]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.symbol(), "TEST");
        assert_eq!(series.timestamp(2), Some(2));
        assert_eq!(series.values(), vec![0.01, -0.02, 0.03]);
    }

    #[test]
    fn test_rejects_unordered_timestamps() {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let result = ReturnSeries::from_pairs(
            "AAPL",
            vec![(base, 0.01), (base + Duration::days(2), 0.0), (base + Duration::days(1), 0.0)],
        );
        assert!(matches!(result, Err(RiskError::ConfigurationInvalid(_))));
    }

    #[test]
    fn test_rejects_duplicate_timestamps() {
        let result = ReturnSeries::from_pairs("AAPL", vec![(3usize, 0.01), (3usize, 0.02)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_nan() {
        let result = ReturnSeries::from_values("AAPL", &[0.01, f64::NAN]);
        assert!(matches!(result, Err(RiskError::ConfigurationInvalid(_))));
    }

    #[test]
    fn test_periods_between() {
        let a = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(NaiveDate::periods_between(a, b), 14);
        assert_eq!(usize::periods_between(4, 9), 5);

        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap();
        assert_eq!(DateTime::<Utc>::periods_between(t0, t0 + Duration::days(30)), 30);
    }

    #[test]
    fn test_empty_series() {
        let series = ReturnSeries::<usize>::from_values("NONE", &[]).unwrap();
        assert!(series.mean().is_none());
        assert!(matches!(
            series.ensure_not_empty(),
            Err(RiskError::DataUnavailable { .. })
        ));
    }
}
