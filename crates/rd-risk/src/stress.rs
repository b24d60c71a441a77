//! Deterministic shock scenarios applied to portfolio value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use rd_types::{config_error, ReturnSeries, RiskResult, TimeIndex};

use crate::stats::{decimal_to_f64, ensure_periods_per_year, ensure_portfolio_value};

/// A named instantaneous market shock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressScenario {
    pub name: String,
    /// Fractional change applied to portfolio value (-0.20 = 20% drop).
    pub shock: Decimal,
}

impl StressScenario {
    pub fn new(name: &str, shock: Decimal) -> Self {
        Self {
            name: name.to_string(),
            shock,
        }
    }
}

/// The standard scenario table.
pub fn default_scenarios() -> Vec<StressScenario> {
    vec![
        StressScenario::new("Moderate Decline -5%", Decimal::new(-5, 2)),
        StressScenario::new("Correction -10%", Decimal::new(-10, 2)),
        StressScenario::new("Bear Market -20%", Decimal::new(-20, 2)),
        StressScenario::new("Severe Crash -30%", Decimal::new(-30, 2)),
        StressScenario::new("2008 Crisis -50%", Decimal::new(-50, 2)),
        StressScenario::new("Black Monday -20%", Decimal::new(-20, 2)),
        StressScenario::new("COVID Crash -35%", Decimal::new(-35, 2)),
        StressScenario::new("Flash Crash -10%", Decimal::new(-10, 2)),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressResult {
    pub shock: Decimal,
    /// `-shock`, as a positive fraction of value lost.
    pub loss_fraction: Decimal,
    pub initial_value: Decimal,
    pub shocked_value: Decimal,
    pub loss_amount: Decimal,
    /// Periods needed to earn back the shock at the historical mean return;
    /// `None` when the mean return is not positive.
    pub recovery_days: Option<f64>,
    pub recovery_years: Option<f64>,
}

/// Project one shock for a given average per-period return.
pub fn project_scenario(
    portfolio_value: Decimal,
    shock: Decimal,
    avg_daily_return: f64,
    periods_per_year: f64,
) -> StressResult {
    let shocked_value = portfolio_value * (Decimal::ONE + shock);
    let recovery_days = if avg_daily_return > 0.0 {
        Some(decimal_to_f64(shock.abs()) / avg_daily_return)
    } else {
        None
    };

    StressResult {
        shock,
        loss_fraction: -shock,
        initial_value: portfolio_value,
        shocked_value,
        loss_amount: portfolio_value - shocked_value,
        recovery_days,
        recovery_years: recovery_days.map(|d| d / periods_per_year),
    }
}

/// Apply every scenario (the default table when `scenarios` is `None`) to
/// `portfolio_value`. The series only supplies the mean return used for the
/// recovery estimate.
pub fn run_stress_test<I: TimeIndex>(
    portfolio_value: Decimal,
    series: &ReturnSeries<I>,
    scenarios: Option<&[StressScenario]>,
    periods_per_year: f64,
) -> RiskResult<BTreeMap<String, StressResult>> {
    ensure_portfolio_value(portfolio_value)?;
    ensure_periods_per_year(periods_per_year)?;

    let defaults;
    let scenarios: &[StressScenario] = match scenarios {
        Some(s) => s,
        None => {
            defaults = default_scenarios();
            &defaults
        }
    };
    validate_scenarios(scenarios)?;

    series.ensure_not_empty()?;
    let avg_daily_return = series.mean().unwrap_or_default();

    Ok(scenarios
        .iter()
        .map(|s| {
            (
                s.name.clone(),
                project_scenario(portfolio_value, s.shock, avg_daily_return, periods_per_year),
            )
        })
        .collect())
}

fn validate_scenarios(scenarios: &[StressScenario]) -> RiskResult<()> {
    let mut seen = std::collections::HashSet::new();
    for s in scenarios {
        if s.shock < Decimal::NEGATIVE_ONE {
            return Err(config_error!(
                "scenario '{}' shock {} is below -100%",
                s.name,
                s.shock
            ));
        }
        if !seen.insert(s.name.as_str()) {
            return Err(config_error!("duplicate stress scenario '{}'", s.name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rd_types::RiskError;
    use rust_decimal_macros::dec;

    #[test]
    fn bear_market_shock_is_exact_for_any_drift() {
        for drift in [-0.01, 0.0, 0.0004, 0.02] {
            let result = project_scenario(dec!(100_000), dec!(-0.20), drift, 252.0);
            assert_eq!(result.shocked_value, dec!(80_000));
            assert_eq!(result.loss_amount, dec!(20_000));
            assert_eq!(result.loss_fraction, dec!(0.20));
        }
    }

    #[test]
    fn recovery_uses_mean_return() {
        let result = project_scenario(dec!(50_000), dec!(-0.10), 0.001, 252.0);
        let days = result.recovery_days.unwrap();
        assert!((days - 100.0).abs() < 1e-9);
        assert!((result.recovery_years.unwrap() - 100.0 / 252.0).abs() < 1e-9);

        let flat = project_scenario(dec!(50_000), dec!(-0.10), 0.0, 252.0);
        assert!(flat.recovery_days.is_none());
        assert!(flat.recovery_years.is_none());
    }

    #[test]
    fn default_table_has_eight_scenarios() {
        let series = ReturnSeries::from_values("AAPL", &[0.01, -0.005, 0.002]).unwrap();
        let results = run_stress_test(dec!(100_000), &series, None, 252.0).unwrap();
        assert_eq!(results.len(), 8);

        let crisis = &results["2008 Crisis -50%"];
        assert_eq!(crisis.shocked_value, dec!(50_000));
        assert_eq!(crisis.loss_amount, dec!(50_000));
        assert!(crisis.recovery_days.is_some());
    }

    #[test]
    fn custom_scenarios_override_defaults() {
        let series = ReturnSeries::from_values("AAPL", &[-0.01, -0.005]).unwrap();
        let custom = vec![StressScenario::new("Rate Shock", dec!(-0.07))];
        let results = run_stress_test(dec!(10_000), &series, Some(&custom), 252.0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results["Rate Shock"].loss_amount, dec!(700));
        assert!(results["Rate Shock"].recovery_days.is_none());
    }

    #[test]
    fn rejects_bad_scenarios() {
        let series = ReturnSeries::from_values("AAPL", &[0.01]).unwrap();
        let dupes = vec![
            StressScenario::new("A", dec!(-0.1)),
            StressScenario::new("A", dec!(-0.2)),
        ];
        assert!(matches!(
            run_stress_test(dec!(1_000), &series, Some(&dupes), 252.0),
            Err(RiskError::ConfigurationInvalid(_))
        ));
        let wipe = vec![StressScenario::new("B", dec!(-1.5))];
        assert!(run_stress_test(dec!(1_000), &series, Some(&wipe), 252.0).is_err());
    }

    #[test]
    fn empty_series_is_data_unavailable() {
        let series = ReturnSeries::from_values("AAPL", &[]).unwrap();
        assert!(matches!(
            run_stress_test(dec!(1_000), &series, None, 252.0),
            Err(RiskError::DataUnavailable { .. })
        ));
    }
}
