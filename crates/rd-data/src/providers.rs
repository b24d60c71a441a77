use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::errors::{DataError, DataResult};
use crate::history::{HistoryPeriod, PricePoint};

/// Source of historical closing prices.
#[async_trait]
pub trait MarketDataProvider: Send + Sync + std::fmt::Debug {
    /// Closing prices for `symbol` over `period`, oldest first.
    async fn fetch_history(&self, symbol: &str, period: HistoryPeriod) -> DataResult<Vec<PricePoint>>;

    /// Latest known close.
    async fn current_price(&self, symbol: &str) -> DataResult<Decimal> {
        let history = self.fetch_history(symbol, HistoryPeriod::FiveDays).await?;
        history
            .last()
            .map(|p| p.close)
            .ok_or_else(|| DataError::NoData {
                symbol: symbol.to_string(),
                period: HistoryPeriod::FiveDays.to_string(),
            })
    }

    fn name(&self) -> &str;
}

/// Reads one CSV file per symbol from a directory.
#[derive(Debug)]
pub struct CsvPriceProvider {
    pub name: String,
    pub data_directory: PathBuf,
    pub file_pattern: String,
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "Datetime", alias = "datetime")]
    timestamp: String,
    #[serde(alias = "Close", alias = "close", alias = "price")]
    close: Option<String>,
}

impl CsvPriceProvider {
    pub fn new<P: AsRef<Path>>(data_directory: P) -> Self {
        Self {
            name: "CSV Provider".to_string(),
            data_directory: data_directory.as_ref().to_path_buf(),
            file_pattern: "{symbol}.csv".to_string(),
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.file_pattern = pattern.to_string();
        self
    }

    pub fn file_path(&self, symbol: &str) -> PathBuf {
        self.data_directory
            .join(self.file_pattern.replace("{symbol}", symbol))
    }

    fn parse_records(&self, symbol: &str, bytes: &[u8]) -> DataResult<Vec<PricePoint>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let mut prices = Vec::new();
        let mut skipped = 0usize;
        for (line, result) in reader.deserialize().enumerate() {
            let record: CsvRecord = result
                .map_err(|e| DataError::parse(format!("{symbol}: CSV parsing error: {e}")))?;
            let Some(close) = record.close.filter(|c| !c.is_empty()) else {
                skipped += 1;
                continue;
            };
            let timestamp = parse_timestamp(&record.timestamp)
                .map_err(|e| DataError::parse(format!("{symbol} row {}: {e}", line + 1)))?;
            let close = parse_decimal(&close)
                .map_err(|e| DataError::parse(format!("{symbol} row {}: {e}", line + 1)))?;
            prices.push(PricePoint::new(timestamp, close));
        }

        if skipped > 0 {
            debug!(symbol, skipped, "skipped rows without a close");
        }
        prices.sort_by_key(|p| p.timestamp);
        Ok(prices)
    }
}

#[async_trait]
impl MarketDataProvider for CsvPriceProvider {
    async fn fetch_history(&self, symbol: &str, period: HistoryPeriod) -> DataResult<Vec<PricePoint>> {
        let path = self.file_path(symbol);
        if !tokio::fs::try_exists(&path).await? {
            return Err(DataError::SourceNotFound(path.to_string_lossy().to_string()));
        }

        let bytes = tokio::fs::read(&path).await?;
        let prices = period.filter(self.parse_records(symbol, &bytes)?);
        info!(symbol, %period, rows = prices.len(), "loaded price history from CSV");
        Ok(prices)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Holds price histories in memory, keyed by symbol.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    histories: DashMap<String, Vec<PricePoint>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(self, symbol: &str, prices: Vec<PricePoint>) -> Self {
        self.insert(symbol, prices);
        self
    }

    pub fn insert(&self, symbol: &str, mut prices: Vec<PricePoint>) {
        prices.sort_by_key(|p| p.timestamp);
        self.histories.insert(symbol.to_string(), prices);
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.histories.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryProvider {
    async fn fetch_history(&self, symbol: &str, period: HistoryPeriod) -> DataResult<Vec<PricePoint>> {
        let prices = self
            .histories
            .get(symbol)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        Ok(period.filter(prices))
    }

    fn name(&self) -> &str {
        "In-Memory Provider"
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("unrecognized date '{raw}'"))
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| format!("invalid price '{raw}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, body: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn csv_provider_reads_date_close_columns() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "AAPL.csv",
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-03,1,1,1,185.50,100\n\
             2024-01-02,1,1,1,184.25,100\n\
             2024-01-04,1,1,1,,100\n",
        );

        let provider = CsvPriceProvider::new(dir.path());
        let prices = provider.fetch_history("AAPL", HistoryPeriod::Max).await.unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].close, dec!(184.25));
        assert_eq!(
            prices[1].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()
        );
        assert_eq!(provider.current_price("AAPL").await.unwrap(), dec!(185.50));
    }

    #[tokio::test]
    async fn csv_provider_accepts_offset_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "SPY.csv",
            "timestamp,close\n2024-01-02 00:00:00-05:00,470.1\n2024-01-03T00:00:00Z,468.9\n",
        );
        let provider = CsvPriceProvider::new(dir.path());
        let prices = provider.fetch_history("SPY", HistoryPeriod::OneYear).await.unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(
            prices[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn csv_provider_uses_custom_file_pattern() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "prices_MSFT_daily.csv", "Date,Close\n2024-01-02,370.6\n");

        let provider = CsvPriceProvider::new(dir.path()).with_pattern("prices_{symbol}_daily.csv");
        assert_eq!(provider.file_path("MSFT"), dir.path().join("prices_MSFT_daily.csv"));
        let prices = provider.fetch_history("MSFT", HistoryPeriod::Max).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].close, dec!(370.6));
    }

    #[tokio::test]
    async fn csv_provider_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvPriceProvider::new(dir.path());
        let err = provider.fetch_history("NOPE", HistoryPeriod::OneYear).await.unwrap_err();
        assert!(matches!(err, DataError::SourceNotFound(_)));
    }

    #[tokio::test]
    async fn csv_provider_rejects_bad_dates() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "BAD.csv", "Date,Close\nyesterday,10\n");
        let provider = CsvPriceProvider::new(dir.path());
        let err = provider.fetch_history("BAD", HistoryPeriod::Max).await.unwrap_err();
        assert!(matches!(err, DataError::ParseError { .. }));
    }

    #[tokio::test]
    async fn in_memory_provider_filters_by_period() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let prices: Vec<PricePoint> = (0..400)
            .map(|d| PricePoint::new(start + chrono::Duration::days(d), dec!(50)))
            .collect();
        let provider = InMemoryProvider::new().with_history("KO", prices);

        let year = provider.fetch_history("KO", HistoryPeriod::OneYear).await.unwrap();
        assert!(year.len() < 400);
        assert!(year.len() >= 365);
        assert!(provider.fetch_history("PEP", HistoryPeriod::Max).await.is_err());
        assert_eq!(provider.symbols(), vec!["KO".to_string()]);
    }
}
