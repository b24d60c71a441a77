//! RiskDesk CLI binary.
//!
//! Reads `{symbol}.csv` price files from a data directory and prints risk
//! reports as JSON on stdout. Logs go to stderr (`RUST_LOG`, default `info`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossbeam_channel::unbounded;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rd_data::{CsvPriceProvider, HistoryPeriod};
use rd_engine::{AlertNotice, DailyAssessment, EngineConfig, RiskEngine};

#[derive(Parser)]
#[command(name = "riskdesk")]
#[command(about = "Portfolio risk metrics from historical prices", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding one CSV price file per symbol
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// File name inside the data directory; `{symbol}` is substituted
    #[arg(long, default_value = "{symbol}.csv", global = true)]
    file_pattern: String,

    /// JSON file overriding engine, limit and assessment settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// History lookback (1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)
    #[arg(long, global = true)]
    period: Option<HistoryPeriod>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full risk assessment for one or more symbols
    Assess {
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Portfolio value the monetary figures are scaled to
        #[arg(long, default_value = "100000")]
        value: Decimal,

        /// Benchmark symbol for beta
        #[arg(long)]
        benchmark: Option<String>,
    },

    /// Correlation matrix across symbols
    Correlation {
        #[arg(required = true, num_args = 2..)]
        symbols: Vec<String>,
    },

    /// Stress scenarios for one symbol
    Stress {
        symbol: String,

        #[arg(long, default_value = "100000")]
        value: Decimal,
    },
}

#[derive(Serialize)]
struct AssessmentReport {
    symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    assessment: Option<DailyAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(period) = cli.period {
        config.history_period = period;
    }

    let provider =
        Arc::new(CsvPriceProvider::new(&cli.data_dir).with_pattern(&cli.file_pattern));

    match cli.command {
        Commands::Assess {
            symbols,
            value,
            benchmark,
        } => {
            if let Some(benchmark) = benchmark {
                config.assessment.benchmark_symbol = benchmark;
            }
            let (alert_tx, alert_rx) = unbounded::<AlertNotice>();
            let engine = RiskEngine::new(provider, config)?.with_alerts(alert_tx);

            let reports: Vec<AssessmentReport> = engine
                .assess_many(&symbols, value)
                .await
                .into_iter()
                .map(|(symbol, outcome)| match outcome {
                    Ok(assessment) => AssessmentReport {
                        symbol,
                        assessment: Some(assessment),
                        error: None,
                    },
                    Err(e) => AssessmentReport {
                        symbol,
                        assessment: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect();
            print_json(&reports)?;

            let alerts = alert_rx.try_iter().count();
            if alerts > 0 {
                warn!(alerts, "limit breaches detected");
            } else {
                info!("all assessed symbols within limits");
            }
        }
        Commands::Correlation { symbols } => {
            let engine = RiskEngine::new(provider, config)?;
            let matrix = engine.correlation(&symbols).await?;
            print_json(&matrix)?;
        }
        Commands::Stress { symbol, value } => {
            let engine = RiskEngine::new(provider, config)?;
            let results = engine.stress(&symbol, value).await?;
            print_json(&results)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
