//! Fetch price history for many symbols and assess them in parallel.

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use rd_data::{
    clean_history, data_quality_score, returns_from_prices, CacheStats, HistoryCache,
    HistoryPeriod, MarketDataProvider, PricePoint,
};
use rd_risk::{
    assess_risk, compute_correlation, run_stress_test, CorrelationMatrix, RiskAlert,
    RiskAssessment, StressResult,
};
use rd_types::{ReturnSeries, RiskError};

use crate::config::EngineConfig;
use crate::errors::{EngineError, EngineResult};

pub type DailySeries = ReturnSeries<DateTime<Utc>>;
pub type DailyAssessment = RiskAssessment<DateTime<Utc>>;

/// Per-symbol outcomes of a batch run, in request order.
pub type BatchOutcome = Vec<(String, EngineResult<DailyAssessment>)>;

/// An alert tagged with the assessment that raised it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotice {
    pub symbol: String,
    pub assessment_id: Uuid,
    pub alert: RiskAlert,
}

/// Fetches, caches and prepares history. Cheap to clone into tasks.
#[derive(Clone)]
struct HistoryLoader {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<HistoryCache>,
    period: HistoryPeriod,
    clean: bool,
    min_quality_score: f64,
}

impl HistoryLoader {
    async fn prices(&self, symbol: &str) -> EngineResult<Arc<Vec<PricePoint>>> {
        if let Some(hit) = self.cache.get(symbol, self.period) {
            debug!(symbol, "history cache hit");
            return Ok(hit);
        }

        let raw = self
            .provider
            .fetch_history(symbol, self.period)
            .await
            .map_err(|e| {
                warn!(symbol, provider = self.provider.name(), error = %e, "history fetch failed");
                RiskError::data_unavailable(format!("{symbol}: {e}"))
            })?;

        let score = data_quality_score(&raw);
        if score < self.min_quality_score {
            warn!(symbol, score, "low quality price history");
        }
        let prices = if self.clean { clean_history(raw) } else { raw };
        Ok(self.cache.store(symbol, self.period, prices))
    }

    async fn returns(&self, symbol: &str) -> EngineResult<DailySeries> {
        let prices = self.prices(symbol).await?;
        if prices.is_empty() {
            return Err(RiskError::data_unavailable(format!(
                "{symbol}: no prices over {}",
                self.period
            ))
            .into());
        }
        Ok(returns_from_prices(symbol, &prices)?)
    }
}

/// Runs risk assessments against a market data provider.
///
/// History is fetched concurrently on the tokio runtime; the CPU-bound
/// assessments of a batch run on the rayon pool. Alerts from every
/// assessment are forwarded to the optional alert channel.
pub struct RiskEngine {
    loader: HistoryLoader,
    config: EngineConfig,
    alert_tx: Option<Sender<AlertNotice>>,
}

impl RiskEngine {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        info!(provider = provider.name(), period = %config.history_period, "creating risk engine");

        let ttl = config.cache_ttl_secs.map(chrono::Duration::seconds);
        let loader = HistoryLoader {
            provider,
            cache: Arc::new(HistoryCache::new(config.cache_max_entries, ttl)),
            period: config.history_period,
            clean: config.clean_history,
            min_quality_score: config.min_quality_score,
        };
        Ok(Self {
            loader,
            config,
            alert_tx: None,
        })
    }

    pub fn with_alerts(mut self, alert_tx: Sender<AlertNotice>) -> Self {
        self.alert_tx = Some(alert_tx);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.loader.cache.stats()
    }

    /// Return series for one symbol. Provider failures surface as
    /// `DataUnavailable`.
    pub async fn load_returns(&self, symbol: &str) -> EngineResult<DailySeries> {
        self.loader.returns(symbol).await
    }

    pub async fn assess(&self, symbol: &str, portfolio_value: Decimal) -> EngineResult<DailyAssessment> {
        let series = self.loader.returns(symbol).await?;
        let benchmark = self.load_benchmark().await;

        let assessment = assess_risk(
            symbol,
            &series,
            benchmark.as_ref(),
            portfolio_value,
            &self.config.limits,
            &self.config.assessment,
        )?;
        self.publish(&assessment);
        Ok(assessment)
    }

    /// Assess every symbol with the same portfolio value. The benchmark is
    /// fetched once and shared by all assessments.
    pub async fn assess_many(&self, symbols: &[String], portfolio_value: Decimal) -> BatchOutcome {
        let benchmark = self.load_benchmark().await.map(Arc::new);
        let loaded = self.load_all(symbols).await;

        let limits = self.config.limits;
        let config = self.config.assessment.clone();
        let batch = tokio::task::spawn_blocking(move || {
            loaded
                .into_par_iter()
                .map(|(symbol, series)| {
                    let outcome = series.and_then(|s| {
                        assess_risk(&symbol, &s, benchmark.as_deref(), portfolio_value, &limits, &config)
                            .map_err(EngineError::from)
                    });
                    (symbol, outcome)
                })
                .collect::<BatchOutcome>()
        })
        .await;

        let outcomes = match batch {
            Ok(outcomes) => outcomes,
            Err(e) => {
                error!(error = %e, "assessment batch panicked");
                symbols
                    .iter()
                    .map(|s| (s.clone(), Err(EngineError::Task(e.to_string()))))
                    .collect()
            }
        };

        for (_, outcome) in &outcomes {
            if let Ok(assessment) = outcome {
                self.publish(assessment);
            }
        }
        let failed = outcomes.iter().filter(|(_, o)| o.is_err()).count();
        info!(symbols = symbols.len(), failed, "batch assessment complete");
        outcomes
    }

    /// Correlation matrix of the given symbols. Symbols without usable
    /// history are listed in `excluded` rather than failing the call.
    pub async fn correlation(&self, symbols: &[String]) -> EngineResult<CorrelationMatrix> {
        let mut series = Vec::with_capacity(symbols.len());
        let mut unavailable = Vec::new();
        for (symbol, loaded) in self.load_all(symbols).await {
            match loaded {
                Ok(s) => series.push(s),
                Err(e) if e.is_data_condition() => {
                    warn!(symbol = %symbol, error = %e, "excluding symbol from correlation");
                    unavailable.push(symbol);
                }
                Err(e) => return Err(e),
            }
        }

        let mut matrix = compute_correlation(&series)?;
        matrix.excluded.extend(unavailable);
        Ok(matrix)
    }

    pub async fn stress(
        &self,
        symbol: &str,
        portfolio_value: Decimal,
    ) -> EngineResult<BTreeMap<String, StressResult>> {
        let series = self.loader.returns(symbol).await?;
        Ok(run_stress_test(
            portfolio_value,
            &series,
            Some(&self.config.assessment.stress_scenarios),
            self.config.assessment.periods_per_year,
        )?)
    }

    async fn load_benchmark(&self) -> Option<DailySeries> {
        let symbol = &self.config.assessment.benchmark_symbol;
        match self.loader.returns(symbol).await {
            Ok(series) => Some(series),
            Err(e) => {
                warn!(benchmark = %symbol, error = %e, "benchmark unavailable, beta will be skipped");
                None
            }
        }
    }

    async fn load_all(&self, symbols: &[String]) -> Vec<(String, EngineResult<DailySeries>)> {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_fetches));
        let mut tasks = JoinSet::new();
        for (idx, symbol) in symbols.iter().enumerate() {
            let loader = self.loader.clone();
            let permits = Arc::clone(&permits);
            let symbol = symbol.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (idx, loader.returns(&symbol).await)
            });
        }

        let mut slots: Vec<Option<EngineResult<DailySeries>>> = symbols.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => error!(error = %e, "history task failed"),
            }
        }

        symbols
            .iter()
            .zip(slots)
            .map(|(symbol, slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(EngineError::Task(format!("history task for {symbol} did not complete")))
                });
                (symbol.clone(), result)
            })
            .collect()
    }

    fn publish(&self, assessment: &DailyAssessment) {
        let Some(tx) = &self.alert_tx else {
            return;
        };
        for alert in &assessment.alerts {
            // Best-effort send; a dropped receiver only loses notifications.
            let _ = tx.try_send(AlertNotice {
                symbol: assessment.symbol.clone(),
                assessment_id: assessment.id,
                alert: alert.clone(),
            });
        }
    }
}
