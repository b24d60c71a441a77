use chrono::{DateTime, Datelike, Duration, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DataError;

/// One closing price observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: Decimal) -> Self {
        Self { timestamp, close }
    }
}

/// Lookback window for a history request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HistoryPeriod {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl HistoryPeriod {
    pub const ALL: [HistoryPeriod; 11] = [
        HistoryPeriod::OneDay,
        HistoryPeriod::FiveDays,
        HistoryPeriod::OneMonth,
        HistoryPeriod::ThreeMonths,
        HistoryPeriod::SixMonths,
        HistoryPeriod::OneYear,
        HistoryPeriod::TwoYears,
        HistoryPeriod::FiveYears,
        HistoryPeriod::TenYears,
        HistoryPeriod::YearToDate,
        HistoryPeriod::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPeriod::OneDay => "1d",
            HistoryPeriod::FiveDays => "5d",
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
            HistoryPeriod::FiveYears => "5y",
            HistoryPeriod::TenYears => "10y",
            HistoryPeriod::YearToDate => "ytd",
            HistoryPeriod::Max => "max",
        }
    }

    /// Earliest timestamp inside the window ending at `anchor`. `None` means
    /// unbounded.
    pub fn lookback_start(&self, anchor: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            HistoryPeriod::OneDay => anchor.checked_sub_signed(Duration::days(1)),
            HistoryPeriod::FiveDays => anchor.checked_sub_signed(Duration::days(5)),
            HistoryPeriod::OneMonth => anchor.checked_sub_months(Months::new(1)),
            HistoryPeriod::ThreeMonths => anchor.checked_sub_months(Months::new(3)),
            HistoryPeriod::SixMonths => anchor.checked_sub_months(Months::new(6)),
            HistoryPeriod::OneYear => anchor.checked_sub_months(Months::new(12)),
            HistoryPeriod::TwoYears => anchor.checked_sub_months(Months::new(24)),
            HistoryPeriod::FiveYears => anchor.checked_sub_months(Months::new(60)),
            HistoryPeriod::TenYears => anchor.checked_sub_months(Months::new(120)),
            HistoryPeriod::YearToDate => anchor
                .date_naive()
                .with_ordinal(1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            HistoryPeriod::Max => None,
        }
    }

    /// Keep only the points inside the window that ends at the latest point.
    pub fn filter(&self, mut prices: Vec<PricePoint>) -> Vec<PricePoint> {
        let Some(anchor) = prices.iter().map(|p| p.timestamp).max() else {
            return prices;
        };
        if let Some(start) = self.lookback_start(anchor) {
            prices.retain(|p| p.timestamp >= start);
        }
        prices
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HistoryPeriod {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        HistoryPeriod::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| DataError::InvalidPeriod(s.to_string()))
    }
}

impl TryFrom<String> for HistoryPeriod {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HistoryPeriod> for String {
    fn from(period: HistoryPeriod) -> Self {
        period.as_str().to_string()
    }
}
