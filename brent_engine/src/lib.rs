pub mod config;
pub mod error;
pub mod data;
pub mod linalg;
pub mod optim;
pub mod models;
pub mod metrics;
pub mod backtest;
pub mod report;
pub mod pipeline;

pub use error::{AnalysisError, Result};
pub use pipeline::{analyze, forecast_only, run_pipeline, AnalysisReport, ArimaForecast};
