//! Error types for the demand_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Malformed input table, missing required columns or an empty location
    #[error("Input error: {0}")]
    Input(String),

    /// A series too short to estimate trend and seasonality
    #[error("Insufficient history for '{key}': {observations} usable observation(s), need at least 2")]
    InsufficientHistory { key: String, observations: usize },

    /// The model fit itself failed or ran past its deadline
    #[error("Forecast failed for '{key}': {reason}")]
    ForecastFailure { key: String, reason: String },

    /// An artifact could not be rendered or written
    #[error("Render error: {0}")]
    Render(String),

    /// Nothing at all could be forecast
    #[error("Pipeline failed: {0}")]
    Fatal(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error while loading configuration
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Error while serializing the payload
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the numerical core
    #[error("Math error: {0}")]
    Math(#[from] demand_math::MathError),
}

impl ForecastError {
    /// Whether the error only concerns a single series and may be skipped
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientHistory { .. }
                | ForecastError::ForecastFailure { .. }
                | ForecastError::Render(_)
        )
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
