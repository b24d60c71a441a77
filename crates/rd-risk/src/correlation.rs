//! Pairwise correlation across several return series.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

use rd_types::{config_error, ReturnSeries, RiskError, RiskResult, TimeIndex};

use crate::stats::{pearson, sample_variance};

/// Symmetric Pearson correlation matrix with a unit diagonal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Row/column labels, in input order.
    pub symbols: Vec<String>,
    pub values: Vec<Vec<f64>>,
    /// Number of aligned timestamps the matrix was computed from.
    pub observations: usize,
    /// Inputs left out for lacking data or variance over the aligned rows.
    pub excluded: Vec<String>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        Some(self.values[i][j])
    }
}

/// Correlate every pair of series over the timestamps they all share.
///
/// Empty series and series that are flat over the aligned rows are excluded;
/// fewer than two usable series, or fewer than two aligned rows, is a data
/// condition.
pub fn compute_correlation<I: TimeIndex>(series: &[ReturnSeries<I>]) -> RiskResult<CorrelationMatrix> {
    let mut seen = HashSet::new();
    for s in series {
        if !seen.insert(s.symbol()) {
            return Err(config_error!("duplicate symbol '{}' in correlation input", s.symbol()));
        }
    }

    let mut excluded: Vec<String> = Vec::new();
    let usable: Vec<&ReturnSeries<I>> = series
        .iter()
        .filter(|s| {
            if s.is_empty() {
                excluded.push(s.symbol().to_string());
                false
            } else {
                true
            }
        })
        .collect();
    ensure_enough_series(usable.len())?;

    let common = common_timestamps(&usable);
    if common.len() < 2 {
        return Err(RiskError::InsufficientOverlap {
            required: 2,
            actual: common.len(),
        });
    }

    let mut columns: Vec<(&str, Vec<f64>)> = Vec::with_capacity(usable.len());
    for s in usable {
        let column = aligned_values(s, &common);
        let flat = sample_variance(&column).map_or(true, |v| v <= f64::EPSILON * f64::EPSILON);
        if flat {
            warn!(symbol = s.symbol(), "excluding series with zero variance from correlation");
            excluded.push(s.symbol().to_string());
        } else {
            columns.push((s.symbol(), column));
        }
    }
    ensure_enough_series(columns.len())?;

    let n = columns.len();
    let mut values = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r = pearson(&columns[i].1, &columns[j].1).unwrap_or_default();
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    debug!(series = n, observations = common.len(), "computed correlation matrix");

    Ok(CorrelationMatrix {
        symbols: columns.iter().map(|(s, _)| s.to_string()).collect(),
        values,
        observations: common.len(),
        excluded,
    })
}

fn ensure_enough_series(count: usize) -> RiskResult<()> {
    if count < 2 {
        return Err(RiskError::insufficient_data(format!(
            "correlation needs at least 2 usable series, got {count}"
        )));
    }
    Ok(())
}

fn common_timestamps<I: TimeIndex>(series: &[&ReturnSeries<I>]) -> Vec<I> {
    let mut iter = series.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let mut common: BTreeSet<I> = first.points().iter().map(|p| p.timestamp).collect();
    for s in iter {
        let stamps: BTreeSet<I> = s.points().iter().map(|p| p.timestamp).collect();
        common = common.intersection(&stamps).copied().collect();
    }
    common.into_iter().collect()
}

fn aligned_values<I: TimeIndex>(series: &ReturnSeries<I>, timestamps: &[I]) -> Vec<f64> {
    let points = series.points();
    timestamps
        .iter()
        .filter_map(|t| {
            points
                .binary_search_by(|p| p.timestamp.cmp(t))
                .ok()
                .map(|idx| points[idx].value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(symbol: &str, phase: usize, n: usize) -> ReturnSeries<usize> {
        let values: Vec<f64> = (0..n)
            .map(|i| (((i + phase) * 5 % 13) as f64 - 6.0) / 500.0)
            .collect();
        ReturnSeries::from_values(symbol, &values).unwrap()
    }

    #[test]
    fn self_correlation_is_exactly_one() {
        let a = wave("AAPL", 0, 50);
        let twin = ReturnSeries::from_pairs("AAPL2", a.points().iter().map(|p| (p.timestamp, p.value))).unwrap();
        let matrix = compute_correlation(&[a, twin]).unwrap();
        assert_eq!(matrix.get("AAPL", "AAPL"), Some(1.0));
        assert_eq!(matrix.get("AAPL", "AAPL2"), Some(1.0));
    }

    #[test]
    fn matrix_is_symmetric() {
        let inputs = vec![wave("A", 0, 40), wave("B", 3, 40), wave("C", 7, 40)];
        let matrix = compute_correlation(&inputs).unwrap();
        assert_eq!(matrix.symbols, vec!["A", "B", "C"]);
        for a in &matrix.symbols {
            for b in &matrix.symbols {
                assert_eq!(matrix.get(a, b), matrix.get(b, a));
                let r = matrix.get(a, b).unwrap();
                assert!((-1.0..=1.0).contains(&r));
            }
        }
    }

    #[test]
    fn aligns_on_intersection() {
        let a = wave("A", 0, 30);
        let b_pairs: Vec<(usize, f64)> = (10..40).map(|i| (i, ((i * 3 % 7) as f64 - 3.0) / 100.0)).collect();
        let b = ReturnSeries::from_pairs("B", b_pairs).unwrap();
        let matrix = compute_correlation(&[a, b]).unwrap();
        assert_eq!(matrix.observations, 20);
    }

    #[test]
    fn one_usable_series_is_absent() {
        let empty = ReturnSeries::from_values("EMPTY", &[]).unwrap();
        let result = compute_correlation(&[wave("A", 0, 30), empty]);
        assert!(matches!(result, Err(RiskError::InsufficientData { .. })));
        assert!(compute_correlation::<usize>(&[]).is_err());
    }

    #[test]
    fn flat_series_excluded() {
        let flat = ReturnSeries::from_values("CASH", &[0.0; 30]).unwrap();
        let inputs = vec![wave("A", 0, 30), wave("B", 2, 30), flat];
        let matrix = compute_correlation(&inputs).unwrap();
        assert_eq!(matrix.symbols.len(), 2);
        assert_eq!(matrix.excluded, vec!["CASH".to_string()]);
    }

    #[test]
    fn duplicate_symbols_rejected() {
        let inputs = vec![wave("A", 0, 30), wave("A", 1, 30)];
        assert!(matches!(
            compute_correlation(&inputs),
            Err(RiskError::ConfigurationInvalid(_))
        ));
    }
}
