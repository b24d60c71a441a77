//! Risk metrics and limit assessment for RiskDesk.
//!
//! Provides:
//! - Historical-simulation VaR and CVaR
//! - Full-period and rolling volatility
//! - Maximum drawdown with peak/trough/recovery search
//! - Sharpe ratio and market beta
//! - Deterministic stress scenarios and cross-asset correlation
//! - A single-asset assessment that checks every metric against [`RiskLimits`]
//!
//! Every estimator is a pure function of a [`ReturnSeries`]. Anything that
//! cannot be computed from the data comes back as a data-condition
//! [`RiskError`], never as a zero.
//!
//! [`RiskLimits`]: rd_types::RiskLimits
//! [`ReturnSeries`]: rd_types::ReturnSeries
//! [`RiskError`]: rd_types::RiskError

pub mod alerts;
pub mod assessment;
pub mod beta;
pub mod correlation;
pub mod drawdown;
pub mod sharpe;
pub mod stats;
pub mod stress;
pub mod var;
pub mod volatility;

pub use alerts::{evaluate_limits, LimitInputs, MetricKind, RiskAlert, RiskStatus};
pub use assessment::{assess_risk, AssessmentConfig, RiskAssessment, UnavailableMetric};
pub use beta::{compute_beta, BetaClass, BetaResult, MIN_BETA_OVERLAP};
pub use correlation::{compute_correlation, CorrelationMatrix};
pub use drawdown::{compute_drawdown, DrawdownResult};
pub use sharpe::{compute_sharpe, SharpeRating, SharpeResult, DEFAULT_RISK_FREE_RATE};
pub use stats::TRADING_PERIODS_PER_YEAR;
pub use stress::{default_scenarios, run_stress_test, StressResult, StressScenario};
pub use var::{compute_cvar, compute_var, CvarResult, VarResult};
pub use volatility::{compute_volatility, PeriodVolatility, RollingVolatility, VolatilityResult};
