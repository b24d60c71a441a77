//! Limit breach alerts and assessment status.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use rd_types::RiskLimits;

/// Every metric an assessment can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    Var95,
    Var99,
    Cvar95,
    Cvar99,
    Volatility,
    MaxDrawdown,
    Sharpe,
    Beta,
    StressTest,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetricKind::Var95 => "VaR(95%)",
            MetricKind::Var99 => "VaR(99%)",
            MetricKind::Cvar95 => "CVaR(95%)",
            MetricKind::Cvar99 => "CVaR(99%)",
            MetricKind::Volatility => "Volatility",
            MetricKind::MaxDrawdown => "Max Drawdown",
            MetricKind::Sharpe => "Sharpe Ratio",
            MetricKind::Beta => "Beta",
            MetricKind::StressTest => "Stress Test",
        };
        write!(f, "{}", s)
    }
}

/// A metric whose observed value breached its configured limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub metric: MetricKind,
    pub observed: f64,
    pub limit: f64,
    pub message: String,
}

/// Overall outcome of an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskStatus {
    Ok,
    Alert,
}

impl RiskStatus {
    pub fn from_alerts(alerts: &[RiskAlert]) -> Self {
        if alerts.is_empty() {
            RiskStatus::Ok
        } else {
            RiskStatus::Alert
        }
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskStatus::Ok => write!(f, "OK"),
            RiskStatus::Alert => write!(f, "ALERT"),
        }
    }
}

/// Headline figures checked against [`RiskLimits`]. `None` means the metric
/// was not available and is not checked.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LimitInputs {
    pub var_95: Option<f64>,
    pub var_99: Option<f64>,
    pub annual_volatility: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub sharpe_ratio: Option<f64>,
}

/// Compare observed metrics with `limits`, in a fixed order: VaR 95, VaR 99,
/// volatility, drawdown, Sharpe.
pub fn evaluate_limits(symbol: &str, inputs: &LimitInputs, limits: &RiskLimits) -> Vec<RiskAlert> {
    let mut alerts = Vec::new();

    check_max(&mut alerts, MetricKind::Var95, inputs.var_95, limits.var95_max);
    check_max(&mut alerts, MetricKind::Var99, inputs.var_99, limits.var99_max);
    check_max(
        &mut alerts,
        MetricKind::Volatility,
        inputs.annual_volatility,
        limits.volatility_max,
    );
    check_max(
        &mut alerts,
        MetricKind::MaxDrawdown,
        inputs.max_drawdown,
        limits.max_drawdown_max,
    );
    check_sharpe(&mut alerts, inputs.sharpe_ratio, limits.sharpe_min);

    for alert in &alerts {
        warn!(symbol, metric = %alert.metric, %alert.message, "RISK ALERT");
    }
    alerts
}

fn check_max(alerts: &mut Vec<RiskAlert>, metric: MetricKind, observed: Option<f64>, limit: f64) {
    let Some(observed) = observed else {
        return;
    };
    if observed > limit {
        alerts.push(RiskAlert {
            metric,
            observed,
            limit,
            message: format!(
                "{} exceeds limit: {:.2}% > {:.2}%",
                metric,
                observed * 100.0,
                limit * 100.0
            ),
        });
    }
}

fn check_sharpe(alerts: &mut Vec<RiskAlert>, observed: Option<f64>, minimum: f64) {
    let Some(observed) = observed else {
        return;
    };
    if observed < minimum {
        alerts.push(RiskAlert {
            metric: MetricKind::Sharpe,
            observed,
            limit: minimum,
            message: format!(
                "Sharpe Ratio below minimum: {:.2} < {:.2}",
                observed, minimum
            ),
        });
    }
}
