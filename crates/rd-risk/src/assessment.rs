//! Single-asset risk assessment: run every estimator, then check limits.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use rd_types::{config_error, ReturnSeries, RiskError, RiskLimits, RiskResult, TimeIndex};

use crate::alerts::{evaluate_limits, LimitInputs, MetricKind, RiskAlert, RiskStatus};
use crate::beta::{compute_beta, BetaResult, MIN_BETA_OVERLAP};
use crate::drawdown::{compute_drawdown, DrawdownResult};
use crate::sharpe::{compute_sharpe, SharpeResult, DEFAULT_RISK_FREE_RATE};
use crate::stats::{ensure_periods_per_year, ensure_portfolio_value, TRADING_PERIODS_PER_YEAR};
use crate::stress::{default_scenarios, run_stress_test, StressResult, StressScenario};
use crate::var::{compute_cvar, compute_var, CvarResult, VarResult};
use crate::volatility::{full_period_volatility, PeriodVolatility};

/// Confidence levels reported by every assessment.
pub const CONFIDENCE_95: f64 = 0.95;
pub const CONFIDENCE_99: f64 = 0.99;

/// Estimator parameters shared by every assessment of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
    pub min_beta_overlap: usize,
    /// Symbol whose returns serve as the beta benchmark.
    pub benchmark_symbol: String,
    pub stress_scenarios: Vec<StressScenario>,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            periods_per_year: TRADING_PERIODS_PER_YEAR,
            min_beta_overlap: MIN_BETA_OVERLAP,
            benchmark_symbol: "SPY".to_string(),
            stress_scenarios: default_scenarios(),
        }
    }
}

impl AssessmentConfig {
    pub fn validate(&self) -> RiskResult<()> {
        if !self.risk_free_rate.is_finite() {
            return Err(config_error!("risk_free_rate must be finite, got {}", self.risk_free_rate));
        }
        ensure_periods_per_year(self.periods_per_year)?;
        if self.min_beta_overlap < 2 {
            return Err(config_error!(
                "min_beta_overlap must be at least 2, got {}",
                self.min_beta_overlap
            ));
        }
        if self.benchmark_symbol.trim().is_empty() {
            return Err(config_error!("benchmark_symbol must not be empty"));
        }
        Ok(())
    }
}

/// Why a metric is missing from an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnavailableMetric {
    pub metric: MetricKind,
    pub reason: String,
}

/// Every metric computed for one asset, plus the limit verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment<I> {
    pub id: Uuid,
    pub symbol: String,
    pub portfolio_value: Decimal,
    pub assessed_at: DateTime<Utc>,
    pub observations: usize,
    pub var_95: Option<VarResult>,
    pub var_99: Option<VarResult>,
    pub cvar_95: Option<CvarResult>,
    pub cvar_99: Option<CvarResult>,
    pub volatility: Option<PeriodVolatility>,
    pub max_drawdown: Option<DrawdownResult<I>>,
    pub sharpe: Option<SharpeResult>,
    pub beta: Option<BetaResult>,
    pub stress_test: Option<BTreeMap<String, StressResult>>,
    pub alerts: Vec<RiskAlert>,
    pub unavailable: Vec<UnavailableMetric>,
    pub status: RiskStatus,
}

impl<I> RiskAssessment<I> {
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    pub fn is_available(&self, metric: MetricKind) -> bool {
        !self.unavailable.iter().any(|u| u.metric == metric)
    }
}

/// Assess one asset.
///
/// An empty series fails with `DataUnavailable` and yields no metrics. Any
/// other data condition only removes the affected metric, which is recorded
/// in `unavailable`. Configuration errors abort the whole call.
pub fn assess_risk<I: TimeIndex>(
    symbol: &str,
    series: &ReturnSeries<I>,
    benchmark: Option<&ReturnSeries<I>>,
    portfolio_value: Decimal,
    limits: &RiskLimits,
    config: &AssessmentConfig,
) -> RiskResult<RiskAssessment<I>> {
    debug!(symbol, observations = series.len(), "risk assessment started");
    let outcome = run_assessment(symbol, series, benchmark, portfolio_value, limits, config);
    match &outcome {
        Ok(assessment) => info!(
            symbol,
            status = %assessment.status,
            alerts = assessment.alerts.len(),
            unavailable = assessment.unavailable.len(),
            "risk assessment complete"
        ),
        Err(e) => warn!(symbol, error = %e, "risk assessment failed"),
    }
    outcome
}

fn run_assessment<I: TimeIndex>(
    symbol: &str,
    series: &ReturnSeries<I>,
    benchmark: Option<&ReturnSeries<I>>,
    portfolio_value: Decimal,
    limits: &RiskLimits,
    config: &AssessmentConfig,
) -> RiskResult<RiskAssessment<I>> {
    limits.validate()?;
    config.validate()?;
    ensure_portfolio_value(portfolio_value)?;
    if series.is_empty() {
        return Err(RiskError::data_unavailable(format!("no return data for {symbol}")));
    }

    let ppy = config.periods_per_year;
    let mut unavailable = Vec::new();
    let notes = &mut unavailable;

    let var_95 = keep_available(
        MetricKind::Var95,
        compute_var(series, CONFIDENCE_95, portfolio_value),
        notes,
    )?;
    let var_99 = keep_available(
        MetricKind::Var99,
        compute_var(series, CONFIDENCE_99, portfolio_value),
        notes,
    )?;
    let cvar_95 = keep_available(
        MetricKind::Cvar95,
        compute_cvar(series, CONFIDENCE_95, portfolio_value),
        notes,
    )?;
    let cvar_99 = keep_available(
        MetricKind::Cvar99,
        compute_cvar(series, CONFIDENCE_99, portfolio_value),
        notes,
    )?;
    let volatility = keep_available(
        MetricKind::Volatility,
        full_period_volatility(series, ppy),
        notes,
    )?;
    let max_drawdown = keep_available(MetricKind::MaxDrawdown, compute_drawdown(series), notes)?;
    let sharpe = keep_available(
        MetricKind::Sharpe,
        compute_sharpe(series, config.risk_free_rate, ppy),
        notes,
    )?;
    let beta_input = match benchmark {
        Some(bench) => compute_beta(series, bench, config.min_beta_overlap),
        None => Err(RiskError::data_unavailable(format!(
            "no benchmark series for {}",
            config.benchmark_symbol
        ))),
    };
    let beta = keep_available(MetricKind::Beta, beta_input, notes)?;
    let stress_test = keep_available(
        MetricKind::StressTest,
        run_stress_test(portfolio_value, series, Some(&config.stress_scenarios), ppy),
        notes,
    )?;

    let alerts = evaluate_limits(
        symbol,
        &LimitInputs {
            var_95: var_95.as_ref().map(|v| v.loss_fraction),
            var_99: var_99.as_ref().map(|v| v.loss_fraction),
            annual_volatility: volatility.as_ref().map(|v| v.annual_volatility),
            max_drawdown: max_drawdown.as_ref().map(|d| d.max_drawdown),
            sharpe_ratio: sharpe.as_ref().map(|s| s.sharpe_ratio),
        },
        limits,
    );

    Ok(RiskAssessment {
        id: Uuid::new_v4(),
        symbol: symbol.to_string(),
        portfolio_value,
        assessed_at: Utc::now(),
        observations: series.len(),
        var_95,
        var_99,
        cvar_95,
        cvar_99,
        volatility,
        max_drawdown,
        sharpe,
        beta,
        stress_test,
        status: RiskStatus::from_alerts(&alerts),
        alerts,
        unavailable,
    })
}

/// Turn a data condition into an absent metric with a note.
fn keep_available<T>(
    metric: MetricKind,
    result: RiskResult<T>,
    unavailable: &mut Vec<UnavailableMetric>,
) -> RiskResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_data_condition() => {
            debug!(%metric, reason = %e, "metric unavailable");
            unavailable.push(UnavailableMetric {
                metric,
                reason: e.to_string(),
            });
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
