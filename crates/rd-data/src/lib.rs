//! Price history acquisition and preparation for RiskDesk.
//!
//! Providers load closing prices; [`validation`] cleans them and turns them
//! into the return series the risk estimators consume.

pub mod cache;
pub mod errors;
pub mod history;
pub mod providers;
pub mod validation;

pub use cache::{CacheStats, HistoryCache};
pub use errors::{DataError, DataResult};
pub use history::{HistoryPeriod, PricePoint};
pub use providers::{CsvPriceProvider, InMemoryProvider, MarketDataProvider};
pub use validation::{clean_history, data_quality_score, returns_from_prices};
