//! Error types for the launch_lens crate

use demand_forecast::ForecastError;
use launch_impact::ImpactError;
use thiserror::Error;

/// Errors raised while configuring or running an analysis
#[derive(Debug, Error)]
pub enum LensError {
    /// Error from the forecasting engine
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// Error from launch analysis
    #[error(transparent)]
    Impact(#[from] ImpactError),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Worker pool could not be started
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LensError {
    /// Whether the caller supplied unusable data or settings
    pub fn is_input_error(&self) -> bool {
        match self {
            LensError::Forecast(e) => {
                e.is_input_error() || matches!(e, ForecastError::InvalidParameter(_))
            }
            LensError::Impact(e) => {
                e.is_input_error() || matches!(e, ImpactError::InvalidParameter(_))
            }
            LensError::ConfigParse(_) | LensError::InvalidConfig(_) => true,
            LensError::ThreadPool(_) | LensError::Io(_) => false,
        }
    }
}

/// Result type for launch_lens operations
pub type Result<T> = std::result::Result<T, LensError>;
