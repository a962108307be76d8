//! Error types for the demand_forecast crate

use sov_math::MathError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Unusable input series: empty, unsorted, duplicated or gapped periods
    #[error("Input error: {0}")]
    InputError(String),

    /// A candidate model failed to converge or diverged
    #[error("Model fit error ({model}): {reason}")]
    ModelFitError { model: String, reason: String },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error while reading CSV records
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error while parsing dates or periods
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error while serializing results
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ForecastError {
    /// Shorthand for a model fit failure
    pub fn model_fit(model: impl Into<String>, reason: impl Into<String>) -> Self {
        ForecastError::ModelFitError {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller supplied unusable data (never recovered locally)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ForecastError::InputError(_) | ForecastError::ParseError(_)
        )
    }
}

impl From<chrono::ParseError> for ForecastError {
    fn from(err: chrono::ParseError) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
