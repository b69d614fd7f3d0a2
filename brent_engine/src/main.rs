/// main.rs — Analysis Entry Point
///
/// Runs the Brent oil price analysis:
///   1. Load config from .env (CLI flags override)
///   2. Load and sort the price CSV
///   3. Stationarity check, order search, ARIMA + GARCH forecasts
///   4. Evaluate, backtest, write chart JSON

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use brent_engine::config::AppConfig;
use brent_engine::run_pipeline;

#[derive(Parser)]
#[command(name = "analyze")]
#[command(about = "Brent oil price analysis: ADF, auto-ARIMA, GARCH(1,1), backtest")]
#[command(version)]
struct Args {
    /// Price CSV with Date and Price columns
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Forecast horizon in days
    #[arg(short = 'n', long)]
    horizon: Option<usize>,

    /// Directory for chart and report JSON
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("╔══════════════════════════════════════════════╗");
    info!("║      BRENT ENGINE  —  ANALYSIS MODE          ║");
    info!("║  ADF + auto-ARIMA + GARCH(1,1) + Backtest    ║");
    info!("╚══════════════════════════════════════════════╝");

    // ── Config ───────────────────────────────────────────────────────────
    let mut cfg = AppConfig::from_env()?;
    if let Some(data) = args.data {
        cfg.data_path = data;
    }
    if let Some(horizon) = args.horizon {
        cfg.horizon = horizon;
    }
    if args.out.is_some() {
        cfg.output_dir = args.out;
    }
    cfg.validate()?;

    info!(
        "Config: data={} horizon={} alpha={} train_fraction={}",
        cfg.data_path.display(), cfg.horizon, cfg.stationarity_alpha, cfg.train_fraction
    );
    info!(
        "Search: max_p={} max_d={} max_q={}  GARCH: window={} out_of_sample={}",
        cfg.max_p, cfg.max_d, cfg.max_q, cfg.garch_window, cfg.garch_out_of_sample
    );

    // ── Run ──────────────────────────────────────────────────────────────
    let report = run_pipeline(&cfg)
        .with_context(|| format!("analysis of {} failed", cfg.data_path.display()))?;

    println!("\n{}", report);
    Ok(())
}
