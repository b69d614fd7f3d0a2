/// config.rs — Centralised configuration loaded from .env
///
/// All parameters consumed by the analysis pipeline and the dashboard
/// service are defined here.  Loading happens once at startup; every stage
/// borrows &AppConfig.
use std::env;
use std::path::PathBuf;

use crate::error::{AnalysisError, Result};

/// Default forecast horizon (days)
pub const DEFAULT_HORIZON: usize = 30;
/// ADF p-value above which a series is treated as non-stationary
pub const DEFAULT_STATIONARITY_ALPHA: f64 = 0.05;
/// Number of trailing observations covered by the GARCH variance window
pub const DEFAULT_GARCH_WINDOW: usize = 30;
/// Share of rows (not dates) used for ARIMA training in the backtest
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct AppConfig {
    // ── Input / output ───────────────────────────────────────────────
    pub data_path: PathBuf,
    /// Chart + report JSON is written here when set
    pub output_dir: Option<PathBuf>,

    // ── Forecasting ──────────────────────────────────────────────────
    pub horizon: usize,
    pub stationarity_alpha: f64,

    // ── Stepwise order search bounds ─────────────────────────────────
    pub max_p: usize,
    pub max_d: usize,
    pub max_q: usize,

    // ── GARCH(1,1) ───────────────────────────────────────────────────
    pub garch_window: usize,
    /// false: one-step variance over the last `garch_window` observations
    /// true:  h-step variance beyond the end of the series
    pub garch_out_of_sample: bool,

    // ── Backtest ─────────────────────────────────────────────────────
    pub train_fraction: f64,

    // ── Dashboard API ────────────────────────────────────────────────
    pub api_host: String,
    pub api_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("../data/processed/BrentOilPrices_cleaned.csv"),
            output_dir: None,
            horizon: DEFAULT_HORIZON,
            stationarity_alpha: DEFAULT_STATIONARITY_ALPHA,
            max_p: 5,
            max_d: 2,
            max_q: 5,
            garch_window: DEFAULT_GARCH_WINDOW,
            garch_out_of_sample: false,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            api_host: "127.0.0.1".into(),
            api_port: 5000,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // ignore missing .env

        let defaults = Self::default();

        let data_path = env::var("DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);
        let output_dir = env::var("OUTPUT_DIR").ok().map(PathBuf::from);

        let garch_out_of_sample =
            parse_env::<bool>("GARCH_OUT_OF_SAMPLE", defaults.garch_out_of_sample)?;

        let cfg = Self {
            data_path,
            output_dir,

            horizon:            parse_env("FORECAST_HORIZON",   defaults.horizon)?,
            stationarity_alpha: parse_env("STATIONARITY_ALPHA", defaults.stationarity_alpha)?,

            max_p: parse_env("MAX_P", defaults.max_p)?,
            max_d: parse_env("MAX_D", defaults.max_d)?,
            max_q: parse_env("MAX_Q", defaults.max_q)?,

            garch_window: parse_env("GARCH_WINDOW", defaults.garch_window)?,
            garch_out_of_sample,

            train_fraction: parse_env("TRAIN_FRACTION", defaults.train_fraction)?,

            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_env::<u16>("API_PORT", defaults.api_port)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(invalid("FORECAST_HORIZON", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.stationarity_alpha) {
            return Err(invalid("STATIONARITY_ALPHA", "must lie in [0, 1)"));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(invalid("TRAIN_FRACTION", "must lie strictly between 0 and 1"));
        }
        if self.garch_window == 0 {
            return Err(invalid("GARCH_WINDOW", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> AnalysisError {
    AnalysisError::Config { key: key.into(), reason: reason.into() }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| AnalysisError::Config { key: key.into(), reason: e.to_string() }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.horizon, 30);
        assert_eq!(cfg.api_port, 5000);
    }

    #[test]
    fn rejects_degenerate_train_fraction() {
        let cfg = AppConfig { train_fraction: 1.0, ..AppConfig::default() };
        assert!(matches!(cfg.validate(), Err(AnalysisError::Config { .. })));
    }

    #[test]
    fn parse_env_reports_key_on_bad_value() {
        env::set_var("BRENT_TEST_BAD_USIZE", "thirty");
        let err = parse_env::<usize>("BRENT_TEST_BAD_USIZE", 30).unwrap_err();
        assert!(err.to_string().contains("BRENT_TEST_BAD_USIZE"));
        env::remove_var("BRENT_TEST_BAD_USIZE");
    }

    #[test]
    fn bool_flags_reject_loose_spellings() {
        env::set_var("BRENT_TEST_BOOL_FLAG", "yes");
        let err = parse_env::<bool>("BRENT_TEST_BOOL_FLAG", false).unwrap_err();
        assert!(matches!(err, AnalysisError::Config { ref key, .. } if key == "BRENT_TEST_BOOL_FLAG"));

        env::set_var("BRENT_TEST_BOOL_FLAG", " true ");
        assert!(parse_env::<bool>("BRENT_TEST_BOOL_FLAG", false).unwrap());
        env::remove_var("BRENT_TEST_BOOL_FLAG");
    }
}
