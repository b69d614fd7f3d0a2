/// error.rs — Library error type
///
/// Loader and model-fitting failures are fatal to the stage that raised them
/// and are surfaced to the caller unchanged.  Metric mismatches never reach
/// this type: the evaluator skips R² instead.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] polars::error::PolarsError),

    #[error("missing required column `{0}`")]
    MissingColumn(String),

    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("model fit failed: {0}")]
    Fit(String),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("config key {key}: {reason}")]
    Config { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
