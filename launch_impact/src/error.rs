//! Error types for the launch_impact crate

use demand_forecast::ForecastError;
use sov_math::MathError;
use thiserror::Error;

/// Errors raised while analysing a launch
#[derive(Debug, Error)]
pub enum ImpactError {
    /// Unusable launch or series data: launch outside history, no baseline,
    /// no viable control group, unknown product
    #[error("Input error: {0}")]
    InputError(String),

    /// Invalid configuration value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from the series store or forecasting engine
    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error while reading the product catalog
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while serializing reports
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ImpactError {
    /// Whether the caller supplied unusable data
    pub fn is_input_error(&self) -> bool {
        match self {
            ImpactError::InputError(_) => true,
            ImpactError::Forecast(e) => e.is_input_error(),
            _ => false,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ImpactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(ImpactError::InputError("x".into()).is_input_error());
        let unknown: ImpactError = ForecastError::InputError("unknown series".into()).into();
        assert!(unknown.is_input_error());
        assert!(!ImpactError::InvalidParameter("alpha".into()).is_input_error());
    }
}
