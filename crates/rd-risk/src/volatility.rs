//! Full-period and rolling-window volatility.

use serde::{Deserialize, Serialize};

use rd_types::{config_error, ReturnSeries, RiskError, RiskResult, TimeIndex};

use crate::stats::{ensure_periods_per_year, sample_std};

/// Standard deviation of every return in the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodVolatility {
    pub daily_volatility: f64,
    pub annual_volatility: f64,
    pub observations: usize,
}

/// Annualized volatility at one position of a rolling window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint<I> {
    pub timestamp: I,
    /// `None` until a full window of observations is available.
    pub annual_volatility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingVolatility<I> {
    pub window: usize,
    pub points: Vec<RollingPoint<I>>,
    /// Value at the last position.
    pub current: Option<f64>,
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum VolatilityResult<I> {
    FullPeriod(PeriodVolatility),
    Rolling(RollingVolatility<I>),
}

impl<I> VolatilityResult<I> {
    /// Headline annual volatility: the full-period figure, or the latest
    /// rolling value.
    pub fn annual_volatility(&self) -> Option<f64> {
        match self {
            VolatilityResult::FullPeriod(v) => Some(v.annual_volatility),
            VolatilityResult::Rolling(r) => r.current,
        }
    }
}

/// Full-period volatility when `window` is `None`, rolling otherwise.
pub fn compute_volatility<I: TimeIndex>(
    series: &ReturnSeries<I>,
    window: Option<usize>,
    periods_per_year: f64,
) -> RiskResult<VolatilityResult<I>> {
    match window {
        None => full_period_volatility(series, periods_per_year).map(VolatilityResult::FullPeriod),
        Some(w) => rolling_volatility(series, w, periods_per_year).map(VolatilityResult::Rolling),
    }
}

pub fn full_period_volatility<I: TimeIndex>(
    series: &ReturnSeries<I>,
    periods_per_year: f64,
) -> RiskResult<PeriodVolatility> {
    ensure_periods_per_year(periods_per_year)?;
    series.ensure_not_empty()?;

    let daily_volatility = sample_std(&series.values()).ok_or_else(|| {
        RiskError::insufficient_data(format!(
            "volatility of {} needs at least 2 returns, got {}",
            series.symbol(),
            series.len()
        ))
    })?;

    Ok(PeriodVolatility {
        daily_volatility,
        annual_volatility: daily_volatility * periods_per_year.sqrt(),
        observations: series.len(),
    })
}

pub fn rolling_volatility<I: TimeIndex>(
    series: &ReturnSeries<I>,
    window: usize,
    periods_per_year: f64,
) -> RiskResult<RollingVolatility<I>> {
    if window < 2 {
        return Err(config_error!("rolling window must be at least 2, got {}", window));
    }
    ensure_periods_per_year(periods_per_year)?;
    series.ensure_not_empty()?;

    let values = series.values();
    let scale = periods_per_year.sqrt();

    let points: Vec<RollingPoint<I>> = series
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let annual_volatility = if i + 1 >= window {
                sample_std(&values[i + 1 - window..=i]).map(|s| s * scale)
            } else {
                None
            };
            RollingPoint {
                timestamp: p.timestamp,
                annual_volatility,
            }
        })
        .collect();

    let filled: Vec<f64> = points.iter().filter_map(|p| p.annual_volatility).collect();
    let mean = if filled.is_empty() {
        None
    } else {
        Some(filled.iter().sum::<f64>() / filled.len() as f64)
    };

    Ok(RollingVolatility {
        window,
        current: points.last().and_then(|p| p.annual_volatility),
        mean,
        max: filled.iter().copied().reduce(f64::max),
        min: filled.iter().copied().reduce(f64::min),
        points,
    })
}
