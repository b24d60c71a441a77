//! Price history cleaning, quality scoring and return construction.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

use rd_types::{ReturnPoint, ReturnSeries};

use crate::errors::DataResult;
use crate::history::PricePoint;

/// A one-period move at or beyond this fraction is treated as a bad print.
pub const OUTLIER_MOVE: f64 = 0.5;

/// Moves beyond this fraction count against the quality score.
pub const EXTREME_MOVE: f64 = 0.2;

/// Sort by time and drop unusable rows: non-positive closes, repeated
/// timestamps (the first wins) and moves of [`OUTLIER_MOVE`] or more relative
/// to the last kept close.
pub fn clean_history(mut prices: Vec<PricePoint>) -> Vec<PricePoint> {
    let raw = prices.len();
    prices.sort_by_key(|p| p.timestamp);

    let mut cleaned: Vec<PricePoint> = Vec::with_capacity(prices.len());
    for point in prices {
        if point.close <= Decimal::ZERO {
            continue;
        }
        if let Some(last) = cleaned.last() {
            if last.timestamp == point.timestamp {
                continue;
            }
            if let Some(change) = pct_change(last.close, point.close) {
                if change.abs() >= OUTLIER_MOVE {
                    continue;
                }
            }
        }
        cleaned.push(point);
    }

    if cleaned.len() != raw {
        debug!(raw, kept = cleaned.len(), "cleaned price history");
    }
    cleaned
}

/// Score raw history from 0 to 100.
///
/// Invalid closes cost up to 30 points, duplicate timestamps up to 20 and
/// extreme moves (beyond [`EXTREME_MOVE`]) up to 20, each in proportion to
/// how often they occur.
pub fn data_quality_score(prices: &[PricePoint]) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    let n = prices.len() as f64;
    let mut score = 100.0;

    let invalid = prices.iter().filter(|p| p.close <= Decimal::ZERO).count();
    score -= invalid as f64 / n * 30.0;

    let mut seen = HashSet::new();
    let duplicates = prices.iter().filter(|p| !seen.insert(p.timestamp)).count();
    score -= duplicates as f64 / n * 20.0;

    let valid: Vec<Decimal> = prices
        .iter()
        .filter(|p| p.close > Decimal::ZERO)
        .map(|p| p.close)
        .collect();
    let moves: Vec<f64> = valid
        .windows(2)
        .filter_map(|w| pct_change(w[0], w[1]))
        .collect();
    if !moves.is_empty() {
        let extreme = moves.iter().filter(|m| m.abs() > EXTREME_MOVE).count();
        score -= extreme as f64 / moves.len() as f64 * 20.0;
    }

    score.max(0.0)
}

/// Percentage-change returns, one per price after the first.
pub fn returns_from_prices(
    symbol: &str,
    prices: &[PricePoint],
) -> DataResult<ReturnSeries<DateTime<Utc>>> {
    let points: Vec<ReturnPoint<DateTime<Utc>>> = prices
        .windows(2)
        .filter_map(|w| pct_change(w[0].close, w[1].close).map(|r| ReturnPoint::new(w[1].timestamp, r)))
        .collect();
    Ok(ReturnSeries::new(symbol, points)?)
}

fn pct_change(previous: Decimal, current: Decimal) -> Option<f64> {
    if previous <= Decimal::ZERO {
        return None;
    }
    current.checked_div(previous)?.to_f64().map(|ratio| ratio - 1.0)
}
