//! Historical-simulation Value-at-Risk and Conditional VaR.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rd_types::{ReturnSeries, RiskResult, TimeIndex};

use crate::stats::{ensure_confidence, ensure_portfolio_value, fraction_of, percentile_sorted, sorted};

/// One-period Value-at-Risk at a given confidence level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarResult {
    pub confidence: f64,
    /// Loss as a positive fraction of portfolio value.
    pub loss_fraction: f64,
    /// `loss_fraction * portfolio_value`, rounded to cents.
    pub loss_amount: Decimal,
}

impl VarResult {
    pub fn interpretation(&self) -> String {
        format!(
            "We are {:.0}% confident we won't lose more than ${} ({:.2}%) in one period",
            self.confidence * 100.0,
            self.loss_amount.round_dp(0),
            self.loss_fraction * 100.0,
        )
    }
}

/// Expected shortfall: mean loss over the returns at or beyond VaR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvarResult {
    pub confidence: f64,
    pub loss_fraction: f64,
    pub loss_amount: Decimal,
    /// Number of returns at or below the VaR threshold.
    pub tail_event_count: usize,
}

impl CvarResult {
    pub fn interpretation(&self) -> String {
        format!(
            "If losses exceed VaR, the average loss is ${} ({:.2}%)",
            self.loss_amount.round_dp(0),
            self.loss_fraction * 100.0,
        )
    }
}

/// VaR from the `(1 - confidence)` percentile of the empirical return
/// distribution.
pub fn compute_var<I: TimeIndex>(
    series: &ReturnSeries<I>,
    confidence: f64,
    portfolio_value: Decimal,
) -> RiskResult<VarResult> {
    ensure_confidence(confidence)?;
    ensure_portfolio_value(portfolio_value)?;
    series.ensure_not_empty()?;

    let returns = sorted(&series.values());
    let cutoff = percentile_sorted(&returns, 1.0 - confidence).unwrap_or_default();
    let loss_fraction = cutoff.abs();

    debug!(
        symbol = series.symbol(),
        confidence,
        loss_fraction,
        "computed VaR"
    );

    Ok(VarResult {
        confidence,
        loss_fraction,
        loss_amount: fraction_of(portfolio_value, loss_fraction),
    })
}

/// CVaR at `confidence`. With no return at or below the VaR threshold the
/// result falls back to the VaR loss itself.
pub fn compute_cvar<I: TimeIndex>(
    series: &ReturnSeries<I>,
    confidence: f64,
    portfolio_value: Decimal,
) -> RiskResult<CvarResult> {
    let var = compute_var(series, confidence, portfolio_value)?;
    let threshold = -var.loss_fraction;

    let tail: Vec<f64> = series
        .points()
        .iter()
        .map(|p| p.value)
        .filter(|r| *r <= threshold)
        .collect();

    let loss_fraction = if tail.is_empty() {
        var.loss_fraction
    } else {
        tail.iter().map(|r| r.abs()).sum::<f64>() / tail.len() as f64
    };

    Ok(CvarResult {
        confidence,
        loss_fraction,
        loss_amount: fraction_of(portfolio_value, loss_fraction),
        tail_event_count: tail.len(),
    })
}
