/// backtest.rs — Chronological Hold-out Backtest
///
/// Splits the loaded series by row count, fits ARIMA on the training prices
/// only, forecasts one step per test row and scores the forecast against the
/// test actuals.
///
/// ARCHITECTURE
/// ┌─────────────────────────────────────────────────────┐
/// │  PriceSeries (sorted, N rows)                       │
/// │        │                                            │
/// │   split_at(⌊f·N⌋)                                   │
/// │        │                                            │
/// │   ┌────┴───────────┐      ┌──────────────────┐      │
/// │   │ train  [0, k)  │      │ test  [k, N)     │      │
/// │   └────┬───────────┘      └────────┬─────────┘      │
/// │        ▼                           │                │
/// │   ArimaModel::fit(order)           │                │
/// │        │                           │                │
/// │   forecast(N − k)  ──────────►  evaluate()          │
/// └─────────────────────────────────────────────────────┘
use serde::Serialize;
use tracing::info;

use crate::config::DEFAULT_TRAIN_FRACTION;
use crate::data::PriceSeries;
use crate::error::{AnalysisError, Result};
use crate::metrics::{evaluate, EvaluationMetrics};
use crate::models::{ArimaModel, ModelOrder};

pub const BACKTEST_LABEL: &str = "ARIMA Backtest";

/// Backtest run parameters.
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    /// Share of rows assigned to training
    pub train_fraction: f64,
    /// Log the per-row comparison table
    pub verbose: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self { train_fraction: DEFAULT_TRAIN_FRACTION, verbose: false }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub order:      ModelOrder,
    pub train_size: usize,
    pub test_size:  usize,
    pub actual:     Vec<f64>,
    pub forecast:   Vec<f64>,
    pub metrics:    EvaluationMetrics,
}

/// (train, test) row counts for a series of `n` rows.
pub fn split_sizes(n: usize, train_fraction: f64) -> Result<(usize, usize)> {
    if n < 2 {
        return Err(AnalysisError::InsufficientData { required: 2, actual: n });
    }
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(AnalysisError::InvalidParameter {
            name:   "train_fraction".into(),
            reason: format!("must lie in (0, 1), got {train_fraction}"),
        });
    }
    let train = (n as f64 * train_fraction).floor() as usize;
    Ok((train, n - train))
}

/// Run the hold-out backtest for a fixed order.
pub fn run_backtest(
    series: &PriceSeries,
    order:  ModelOrder,
    bt_cfg: &BacktestConfig,
) -> Result<BacktestReport> {
    let (train_size, test_size) = split_sizes(series.len(), bt_cfg.train_fraction)?;
    let (train, test) = series.split_at(train_size);

    info!("═══════════════════════════════════════════════");
    info!("  ARIMA{} BACKTEST  — {} train / {} test rows", order, train_size, test_size);
    info!("═══════════════════════════════════════════════");

    let model = ArimaModel::fit(&train.prices(), order)?;
    let forecast = model.forecast(test_size);
    let actual = test.prices();

    let metrics = evaluate(&actual, &forecast, BACKTEST_LABEL);
    info!("{}", metrics);

    let report = BacktestReport { order, train_size, test_size, actual, forecast, metrics };
    if bt_cfg.verbose {
        print_comparison(&report, test_size);
    }
    Ok(report)
}

/// Print the first `top_n` rows of actual vs forecast.
pub fn print_comparison(report: &BacktestReport, top_n: usize) {
    println!("\n{:<6} {:<12} {:<12} {:<10}", "N", "ACTUAL", "FORECAST", "ERROR");
    println!("{}", "─".repeat(42));
    for (i, (a, f)) in report.actual.iter().zip(&report.forecast).enumerate().take(top_n) {
        println!("{:<6} {:<12.2} {:<12.2} {:<+10.3}", i + 1, a, f, a - f);
    }
}
