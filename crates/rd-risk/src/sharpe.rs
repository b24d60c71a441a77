//! Sharpe ratio with geometric annualization.

use serde::{Deserialize, Serialize};
use std::fmt;

use rd_types::{config_error, ReturnSeries, RiskError, RiskResult, TimeIndex};

use crate::stats::{ensure_periods_per_year, sample_std};

/// Default annual risk-free rate.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.04;

/// Qualitative Sharpe bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SharpeRating {
    Exceptional,
    VeryGood,
    Good,
    Acceptable,
    Poor,
    LosingMoney,
}

impl SharpeRating {
    pub fn from_ratio(sharpe: f64) -> Self {
        if sharpe > 3.0 {
            SharpeRating::Exceptional
        } else if sharpe > 2.0 {
            SharpeRating::VeryGood
        } else if sharpe > 1.0 {
            SharpeRating::Good
        } else if sharpe > 0.5 {
            SharpeRating::Acceptable
        } else if sharpe > 0.0 {
            SharpeRating::Poor
        } else {
            SharpeRating::LosingMoney
        }
    }
}

impl fmt::Display for SharpeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SharpeRating::Exceptional => "Exceptional",
            SharpeRating::VeryGood => "Very Good",
            SharpeRating::Good => "Good",
            SharpeRating::Acceptable => "Acceptable",
            SharpeRating::Poor => "Poor",
            SharpeRating::LosingMoney => "Losing Money",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharpeResult {
    pub sharpe_ratio: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub risk_free_rate: f64,
    pub rating: SharpeRating,
}

impl SharpeResult {
    pub fn interpretation(&self) -> String {
        format!(
            "Sharpe Ratio: {:.2} ({}) - earning {:.2} units of return per unit of risk",
            self.sharpe_ratio, self.rating, self.sharpe_ratio
        )
    }
}

/// `(annualized_return - risk_free_rate) / annualized_volatility`, where the
/// return is annualized geometrically from the compounded total return.
pub fn compute_sharpe<I: TimeIndex>(
    series: &ReturnSeries<I>,
    risk_free_rate: f64,
    periods_per_year: f64,
) -> RiskResult<SharpeResult> {
    if !risk_free_rate.is_finite() {
        return Err(config_error!("risk-free rate must be finite, got {}", risk_free_rate));
    }
    ensure_periods_per_year(periods_per_year)?;
    series.ensure_not_empty()?;

    let returns = series.values();
    if returns.len() < 2 {
        return Err(RiskError::insufficient_data(format!(
            "Sharpe ratio of {} needs at least 2 returns, got {}",
            series.symbol(),
            returns.len()
        )));
    }

    let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
    let years = returns.len() as f64 / periods_per_year;
    let annualized_return = if growth > 0.0 {
        growth.powf(1.0 / years) - 1.0
    } else {
        -1.0
    };

    let annualized_volatility = sample_std(&returns).unwrap_or_default() * periods_per_year.sqrt();
    if annualized_volatility <= f64::EPSILON {
        return Err(RiskError::degenerate(
            "sharpe",
            format!("{} has zero return volatility", series.symbol()),
        ));
    }

    let sharpe_ratio = (annualized_return - risk_free_rate) / annualized_volatility;

    Ok(SharpeResult {
        sharpe_ratio,
        annualized_return,
        annualized_volatility,
        risk_free_rate,
        rating: SharpeRating::from_ratio(sharpe_ratio),
    })
}
