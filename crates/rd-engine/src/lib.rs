//! Risk assessment engine for RiskDesk.
//!
//! Wires a [`MarketDataProvider`](rd_data::MarketDataProvider) to the
//! estimators in `rd-risk`: history is fetched concurrently, assessed on the
//! rayon pool, and limit breaches are forwarded over a crossbeam channel.

pub mod config;
pub mod engine;
pub mod errors;

pub use config::EngineConfig;
pub use engine::{AlertNotice, BatchOutcome, DailyAssessment, DailySeries, RiskEngine};
pub use errors::{EngineError, EngineResult};
