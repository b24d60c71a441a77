//! Sample statistics shared by the estimators.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use rd_types::{config_error, ReturnSeries, RiskResult, TimeIndex};

/// Trading days per year, the default annualization constant.
pub const TRADING_PERIODS_PER_YEAR: f64 = 252.0;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator). Needs at least two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    sample_covariance(values, values)
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Sample covariance of two equally long slices.
pub fn sample_covariance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let mean_a = mean(a)?;
    let mean_b = mean(b)?;
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    Some(sum / (a.len() - 1) as f64)
}

/// Pearson correlation, `None` when either side has zero variance.
///
/// Computed as `cov / sqrt(var_a * var_b)` so that a series correlated with
/// itself yields exactly 1.0.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let cov = sample_covariance(a, b)?;
    let var_a = sample_variance(a)?;
    let var_b = sample_variance(b)?;
    if var_a <= f64::EPSILON * f64::EPSILON || var_b <= f64::EPSILON * f64::EPSILON {
        return None;
    }
    Some((cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0))
}

/// Percentile of an ascending-sorted slice with linear interpolation between
/// the two nearest order statistics. `q` is a fraction in `[0, 1]`.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Values of two series at the timestamps both contain, in time order.
pub fn inner_join<I: TimeIndex>(a: &ReturnSeries<I>, b: &ReturnSeries<I>) -> (Vec<f64>, Vec<f64>) {
    let (pa, pb) = (a.points(), b.points());
    let (mut i, mut j) = (0, 0);
    let mut left = Vec::new();
    let mut right = Vec::new();

    while i < pa.len() && j < pb.len() {
        match pa[i].timestamp.cmp(&pb[j].timestamp) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                left.push(pa[i].value);
                right.push(pb[j].value);
                i += 1;
                j += 1;
            }
        }
    }

    (left, right)
}

/// Money amount for a fractional share of `value`, rounded to cents.
pub fn fraction_of(value: Decimal, fraction: f64) -> Decimal {
    (value * Decimal::from_f64_retain(fraction).unwrap_or_default()).round_dp(2)
}

pub fn ensure_confidence(confidence: f64) -> RiskResult<()> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(config_error!(
            "confidence must lie strictly between 0 and 1, got {}",
            confidence
        ));
    }
    Ok(())
}

pub fn ensure_portfolio_value(value: Decimal) -> RiskResult<()> {
    if value <= Decimal::ZERO {
        return Err(config_error!("portfolio value must be positive, got {}", value));
    }
    Ok(())
}

pub fn ensure_periods_per_year(periods_per_year: f64) -> RiskResult<()> {
    if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return Err(config_error!(
            "periods per year must be positive, got {}",
            periods_per_year
        ));
    }
    Ok(())
}

pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
