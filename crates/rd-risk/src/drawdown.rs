//! Peak-to-trough drawdown with recovery search.

use serde::{Deserialize, Serialize};

use rd_types::{ReturnSeries, RiskResult, TimeIndex};

/// Worst decline of the cumulative growth path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownResult<I> {
    /// Worst decline from a prior high, as a positive fraction.
    pub max_drawdown: f64,
    /// Decline from the running high at the last observation.
    pub current_drawdown: f64,
    /// Most recent all-time high before the trough.
    pub peak: I,
    pub trough: I,
    /// First point at or after the trough back at a high; `None` while the
    /// drawdown is ongoing.
    pub recovery: Option<I>,
    /// Trough minus peak, in the index's unit (days for dates).
    pub drawdown_duration: i64,
    pub recovery_duration: Option<i64>,
}

impl<I: TimeIndex> DrawdownResult<I> {
    pub fn is_recovered(&self) -> bool {
        self.recovery.is_some()
    }

    pub fn interpretation(&self) -> String {
        format!(
            "Worst decline: {:.2}% from {} to {}",
            self.max_drawdown * 100.0,
            self.peak,
            self.trough
        )
    }
}

pub fn compute_drawdown<I: TimeIndex>(series: &ReturnSeries<I>) -> RiskResult<DrawdownResult<I>> {
    series.ensure_not_empty()?;
    let points = series.points();

    let mut cumulative = Vec::with_capacity(points.len());
    let mut running_max = Vec::with_capacity(points.len());
    let mut drawdowns = Vec::with_capacity(points.len());

    let mut growth = 1.0;
    let mut high = f64::MIN;
    for p in points {
        growth *= 1.0 + p.value;
        high = high.max(growth);
        cumulative.push(growth);
        running_max.push(high);
        // A wiped-out path never regains a positive high.
        let dd = if high > 0.0 { (growth - high) / high } else { -1.0 };
        drawdowns.push(dd);
    }

    // First occurrence of the deepest drawdown.
    let mut trough_idx = 0;
    for (i, dd) in drawdowns.iter().enumerate() {
        if *dd < drawdowns[trough_idx] {
            trough_idx = i;
        }
    }

    let peak_value = running_max[trough_idx];
    let peak_idx = (0..=trough_idx)
        .rev()
        .find(|&i| cumulative[i] == peak_value)
        .unwrap_or(0);

    let recovery_idx = (trough_idx..points.len()).find(|&i| drawdowns[i] >= 0.0);

    let peak = points[peak_idx].timestamp;
    let trough = points[trough_idx].timestamp;
    let recovery = recovery_idx.map(|i| points[i].timestamp);

    Ok(DrawdownResult {
        max_drawdown: drawdowns[trough_idx].abs(),
        current_drawdown: drawdowns.last().copied().unwrap_or_default().abs(),
        peak,
        trough,
        recovery,
        drawdown_duration: I::periods_between(peak, trough),
        recovery_duration: recovery.map(|r| I::periods_between(trough, r)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rd_types::RiskError;

    #[test]
    fn monotonic_growth_has_no_drawdown() {
        let series = ReturnSeries::from_values("UP", &[0.01; 20]).unwrap();
        let dd = compute_drawdown(&series).unwrap();
        assert_eq!(dd.max_drawdown, 0.0);
        assert_eq!(dd.peak, 0);
        assert_eq!(dd.trough, 0);
        assert_eq!(dd.recovery, Some(0));
        assert_eq!(dd.drawdown_duration, 0);
        assert_eq!(dd.recovery_duration, Some(0));
    }

    #[test]
    fn finds_peak_trough_and_recovery() {
        // growth: 1.10, 0.99, 0.891, 1.0692, 1.1761
        let series = ReturnSeries::from_values("X", &[0.10, -0.10, -0.10, 0.20, 0.10]).unwrap();
        let dd = compute_drawdown(&series).unwrap();

        let expected: f64 = (0.891 - 1.10) / 1.10;
        assert!((dd.max_drawdown - expected.abs()).abs() < 1e-12);
        assert_eq!(dd.peak, 0);
        assert_eq!(dd.trough, 2);
        assert_eq!(dd.recovery, Some(4));
        assert_eq!(dd.drawdown_duration, 2);
        assert_eq!(dd.recovery_duration, Some(2));
        assert_eq!(dd.current_drawdown, 0.0);
    }

    #[test]
    fn ongoing_drawdown_is_not_recovered() {
        let series = ReturnSeries::from_values("X", &[0.05, -0.20, 0.05]).unwrap();
        let dd = compute_drawdown(&series).unwrap();
        assert_eq!(dd.trough, 1);
        assert!(!dd.is_recovered());
        assert!(dd.recovery_duration.is_none());
        assert!(dd.current_drawdown > 0.0);
    }

    #[test]
    fn peak_is_most_recent_high_before_trough() {
        // flat day after the high keeps the running max equal
        let series = ReturnSeries::from_values("X", &[0.10, 0.0, -0.05]).unwrap();
        let dd = compute_drawdown(&series).unwrap();
        assert_eq!(dd.peak, 1);
        assert_eq!(dd.trough, 2);
    }

    #[test]
    fn durations_use_calendar_days() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let series = ReturnSeries::from_pairs(
            "X",
            vec![(d(2), 0.02), (d(5), -0.04), (d(9), -0.01), (d(16), 0.08)],
        )
        .unwrap();
        let dd = compute_drawdown(&series).unwrap();
        assert_eq!(dd.peak, d(2));
        assert_eq!(dd.trough, d(9));
        assert_eq!(dd.drawdown_duration, 7);
        assert_eq!(dd.recovery, Some(d(16)));
        assert_eq!(dd.recovery_duration, Some(7));
        assert_eq!(dd.interpretation(), format!(
            "Worst decline: {:.2}% from 2024-01-02 to 2024-01-09",
            dd.max_drawdown * 100.0
        ));
    }

    #[test]
    fn total_loss_on_first_period_is_full_drawdown() {
        let series = ReturnSeries::from_values("X", &[-1.0, 0.0, 0.0, 0.01, -0.01]).unwrap();
        let dd = compute_drawdown(&series).unwrap();
        assert_eq!(dd.max_drawdown, 1.0);
        assert_eq!(dd.current_drawdown, 1.0);
        assert_eq!(dd.peak, 0);
        assert_eq!(dd.trough, 0);
        assert!(!dd.is_recovered());
    }

    #[test]
    fn empty_series_is_data_unavailable() {
        let series = ReturnSeries::from_values("X", &[]).unwrap();
        assert!(matches!(
            compute_drawdown(&series),
            Err(RiskError::DataUnavailable { .. })
        ));
    }
}
