/// main.rs — Dashboard API Entry Point
///
/// Loads the price CSV once, runs the ARIMA forecast on a blocking thread
/// and serves the results over HTTP.
///
/// Usage:
///   cargo run --bin dashboard
///   DATA_PATH=prices.csv API_PORT=8080 cargo run --bin dashboard

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use brent_dashboard::{router, AppState};
use brent_engine::config::AppConfig;
use brent_engine::data::load_prices;
use brent_engine::forecast_only;

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    // ── Config ───────────────────────────────────────────────────────────
    let cfg = AppConfig::from_env()?;

    // ── Data + startup forecast ──────────────────────────────────────────
    let path = cfg.data_path.clone();
    let series = tokio::task::spawn_blocking(move || load_prices(&path))
        .await?
        .with_context(|| format!("loading {}", cfg.data_path.display()))?;

    let forecast = {
        let series = series.clone();
        let cfg = cfg.clone();
        match tokio::task::spawn_blocking(move || forecast_only(&series, &cfg)).await? {
            Ok(fc) => Some(fc),
            Err(e) => {
                warn!("Startup forecast failed: {e}; serving placeholder");
                None
            }
        }
    };

    let app = router(AppState::new(series, forecast));

    // ── Serve ────────────────────────────────────────────────────────────
    let addr: SocketAddr = format!("{}:{}", cfg.api_host, cfg.api_port)
        .parse()
        .with_context(|| format!("invalid API_HOST:API_PORT {}:{}", cfg.api_host, cfg.api_port))?;

    info!("brent_dashboard v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
