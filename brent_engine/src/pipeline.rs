/// pipeline.rs — End-to-end Brent price analysis
///
/// Stage order (single-threaded, each stage fatal on error):
///
/// ```text
///   load → ADF (→ difference → ADF) → order search → ARIMA fit/forecast
///        → evaluate → GARCH fit/forecast → evaluate → hold-out backtest
/// ```
///
/// Human-readable diagnostics go to stdout; structured progress goes
/// through `tracing`.
use std::fmt;
use std::path::Path;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::backtest::{run_backtest, BacktestConfig, BacktestReport};
use crate::config::AppConfig;
use crate::data::{load_prices, PriceSeries};
use crate::error::Result;
use crate::metrics::{evaluate, EvaluationMetrics};
use crate::models::garch::GarchFit;
use crate::models::stationarity::difference;
use crate::models::{
    adf_test, AdfReport, ArimaModel, Garch11, GarchForecast, ModelOrder, OrderSearch,
    SelectedOrder,
};
use crate::report::{write_json, Chart, ChartSeries, ARIMA_CHART_FILE, GARCH_CHART_FILE, REPORT_FILE};

/// ARIMA point forecast on a daily calendar starting at the last observed date.
#[derive(Debug, Clone, Serialize)]
pub struct ArimaForecast {
    pub order:  ModelOrder,
    pub values: Vec<f64>,
    pub dates:  Vec<NaiveDate>,
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub n_obs:           usize,
    pub first_date:      Option<NaiveDate>,
    pub last_date:       Option<NaiveDate>,
    pub adf:             AdfReport,
    pub adf_differenced: Option<AdfReport>,
    pub selected:        SelectedOrder,
    pub arima:           ArimaModel,
    pub forecast:        ArimaForecast,
    pub arima_metrics:   EvaluationMetrics,
    pub garch:           GarchFit,
    pub garch_forecast:  GarchForecast,
    pub garch_metrics:   EvaluationMetrics,
    pub backtest:        BacktestReport,
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = |d: Option<NaiveDate>| d.map_or_else(|| "n/a".to_owned(), |d| d.to_string());
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  BRENT OIL PRICE ANALYSIS")?;
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  Observations   : {}", self.n_obs)?;
        writeln!(f, "  Date range     : {} → {}", date(self.first_date), date(self.last_date))?;
        writeln!(f, "  ADF p-value    : {:.4}", self.adf.p_value)?;
        if let Some(diff) = &self.adf_differenced {
            writeln!(f, "  ADF (Δ) p-value: {:.4}", diff.p_value)?;
        }
        writeln!(f, "  ARIMA order    : {}", self.selected.order)?;
        writeln!(f, "  ARIMA AIC      : {:.2}", self.arima.aic)?;
        writeln!(
            f,
            "  GARCH ω/α/β    : {:.4} / {:.4} / {:.4}",
            self.garch.model.omega, self.garch.model.alpha, self.garch.model.beta
        )?;
        writeln!(f, "  Horizon        : {} days", self.forecast.values.len())?;
        writeln!(f, "  ARIMA MAE/RMSE : {:.4} / {:.4}", self.arima_metrics.mae, self.arima_metrics.rmse)?;
        writeln!(f, "  GARCH MAE/RMSE : {:.4} / {:.4}", self.garch_metrics.mae, self.garch_metrics.rmse)?;
        writeln!(
            f,
            "  Backtest       : {} train / {} test, MAE {:.4}, RMSE {:.4}",
            self.backtest.train_size,
            self.backtest.test_size,
            self.backtest.metrics.mae,
            self.backtest.metrics.rmse
        )?;
        writeln!(f, "════════════════════════════════════════════")
    }
}

/// Load the configured CSV, analyse it and write charts when an output
/// directory is configured.
pub fn run_pipeline(cfg: &AppConfig) -> Result<AnalysisReport> {
    let series = load_prices(&cfg.data_path)?;
    let report = analyze(&series, cfg)?;
    if let Some(dir) = &cfg.output_dir {
        write_outputs(dir, &series, &report)?;
    }
    Ok(report)
}

/// Run every analysis stage on an already loaded series.
pub fn analyze(series: &PriceSeries, cfg: &AppConfig) -> Result<AnalysisReport> {
    cfg.validate()?;
    let prices = series.prices();
    info!("Analysing {} prices ({} rows)", prices.len(), series.len());

    // ── Stationarity ──────────────────────────────────────────────────────
    let adf = adf_test(&prices)?;
    print_adf(&adf);
    let adf_differenced = if adf.p_value > cfg.stationarity_alpha {
        println!("Applying first-order differencing...");
        let diff = adf_test(&difference(&prices, 1))?;
        print_adf(&diff);
        Some(diff)
    } else {
        None
    };

    // ── Order selection ───────────────────────────────────────────────────
    let selected = search_for(cfg).select(&prices)?;
    println!("\nOptimal ARIMA Order: {}", selected.order);

    // ── ARIMA ─────────────────────────────────────────────────────────────
    let arima = ArimaModel::fit(&prices, selected.order)?;
    info!("\n{}", arima.summary());
    let forecast = ArimaForecast {
        order:  selected.order,
        values: arima.forecast(cfg.horizon),
        dates:  forecast_dates(series.last_date(), cfg.horizon),
    };
    let arima_metrics = evaluate(tail(&prices, cfg.horizon), &forecast.values, "ARIMA");
    print_metrics(&arima_metrics);

    // ── GARCH ─────────────────────────────────────────────────────────────
    let garch = Garch11::fit(&prices)?;
    let garch_forecast = if cfg.garch_out_of_sample {
        garch.forecast_ahead(cfg.garch_window)
    } else {
        garch.forecast_window(cfg.garch_window)
    };
    let garch_metrics = evaluate(tail(&prices, cfg.garch_window), &garch_forecast.variance, "GARCH");
    print_metrics(&garch_metrics);

    // ── Backtest ──────────────────────────────────────────────────────────
    let bt_cfg = BacktestConfig { train_fraction: cfg.train_fraction, verbose: false };
    let backtest = run_backtest(series, selected.order, &bt_cfg)?;
    print_metrics(&backtest.metrics);

    Ok(AnalysisReport {
        n_obs: prices.len(),
        first_date: series.first_date(),
        last_date: series.last_date(),
        adf,
        adf_differenced,
        selected,
        arima,
        forecast,
        arima_metrics,
        garch,
        garch_forecast,
        garch_metrics,
        backtest,
    })
}

/// Order search and ARIMA forecast only; what the dashboard serves.
pub fn forecast_only(series: &PriceSeries, cfg: &AppConfig) -> Result<ArimaForecast> {
    let prices = series.prices();
    let selected = search_for(cfg).select(&prices)?;
    let model = ArimaModel::fit(&prices, selected.order)?;
    info!("Dashboard forecast: ARIMA{} over {} days", selected.order, cfg.horizon);
    Ok(ArimaForecast {
        order:  selected.order,
        values: model.forecast(cfg.horizon),
        dates:  forecast_dates(series.last_date(), cfg.horizon),
    })
}

/// `n` consecutive days beginning at `last` itself.
pub fn forecast_dates(last: Option<NaiveDate>, n: usize) -> Vec<NaiveDate> {
    let Some(last) = last else { return Vec::new() };
    (0..n as u64).filter_map(|i| last.checked_add_days(Days::new(i))).collect()
}

/// Write both charts and the full report into `dir`.
pub fn write_outputs(dir: &Path, series: &PriceSeries, report: &AnalysisReport) -> Result<()> {
    let prices = series.prices();
    let price_dates = series.price_dates();
    let actual = ChartSeries::new("Actual Prices", &price_dates, &prices);

    let horizon_dates: Vec<Option<NaiveDate>> =
        report.forecast.dates.iter().copied().map(Some).collect();
    let arima_chart = Chart {
        title:   "Brent Oil Price Forecast (ARIMA)".into(),
        x_label: "Year".into(),
        y_label: "Price (USD per Barrel)".into(),
        series:  vec![
            actual.clone(),
            ChartSeries::new("ARIMA Forecast", &horizon_dates, &report.forecast.values),
        ],
    };

    let gf = &report.garch_forecast;
    let variance_dates: Vec<Option<NaiveDate>> = if gf.out_of_sample {
        // Days after the last observation.
        forecast_dates(report.last_date, gf.variance.len() + 1)
            .into_iter()
            .skip(1)
            .map(Some)
            .collect()
    } else {
        price_dates[gf.start.min(price_dates.len())..].to_vec()
    };
    let garch_chart = Chart {
        title:   "Brent Oil Price Volatility Forecast (GARCH)".into(),
        x_label: "Year".into(),
        y_label: "Price Volatility".into(),
        series:  vec![
            actual,
            ChartSeries::new("GARCH Volatility Forecast", &variance_dates, &gf.variance),
        ],
    };

    write_json(dir, ARIMA_CHART_FILE, &arima_chart)?;
    write_json(dir, GARCH_CHART_FILE, &garch_chart)?;
    write_json(dir, REPORT_FILE, report)?;
    Ok(())
}

fn search_for(cfg: &AppConfig) -> OrderSearch {
    OrderSearch { max_p: cfg.max_p, max_d: cfg.max_d, max_q: cfg.max_q, ..OrderSearch::default() }
}

fn tail(data: &[f64], n: usize) -> &[f64] {
    &data[data.len().saturating_sub(n)..]
}

fn print_adf(report: &AdfReport) {
    println!("\nAugmented Dickey-Fuller Test:");
    println!("ADF Statistic: {}", report.statistic);
    println!("p-value: {}", report.p_value);
}

fn print_metrics(metrics: &EvaluationMetrics) {
    println!();
    for line in metrics.console_lines() {
        println!("{line}");
    }
}
