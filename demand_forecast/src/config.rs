//! Forecasting configuration threaded through every engine call

use crate::data::Granularity;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Options recognised by the forecasting engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of periods to forecast
    pub horizon: usize,
    /// Seasonal cycle length in periods
    pub seasonal_period: usize,
    /// Full seasonal cycles required before seasonal terms are fitted
    pub min_seasonal_cycles: usize,
    /// Share of history held out for validation, clamped to 10-20%
    pub validation_fraction: f64,
    /// Coverage of the reported forecast interval
    pub confidence_level: f64,
    /// Interval inflation per unit of model disagreement
    pub disagreement_penalty: f64,
    /// Cap on candidate orders evaluated by the ARIMA grid search
    pub max_fit_iterations: usize,
    /// Candidate changepoints for the piecewise trend model
    pub changepoints: usize,
    /// Share of history in which changepoints may be placed
    pub changepoint_range: f64,
    /// Ridge penalty on changepoint slope adjustments
    pub changepoint_penalty: f64,
    /// Fourier pairs used for the seasonal terms of the trend model
    pub fourier_order: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 12,
            seasonal_period: 12,
            min_seasonal_cycles: 2,
            validation_fraction: 0.15,
            confidence_level: 0.95,
            disagreement_penalty: 1.0,
            max_fit_iterations: 24,
            changepoints: 5,
            changepoint_range: 0.8,
            changepoint_penalty: 1.0,
            fourier_order: 3,
        }
    }
}

impl ForecastConfig {
    /// Defaults with the seasonal period of a calendar granularity
    pub fn for_granularity(granularity: Granularity) -> Self {
        Self {
            seasonal_period: granularity.default_seasonal_period(),
            ..Self::default()
        }
    }

    /// Set the forecast horizon
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the seasonal period
    pub fn with_seasonal_period(mut self, seasonal_period: usize) -> Self {
        self.seasonal_period = seasonal_period;
        self
    }

    /// History length below which seasonal decomposition is skipped
    pub fn min_seasonal_history(&self) -> usize {
        self.seasonal_period * self.min_seasonal_cycles.max(2)
    }

    /// Validate parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        if self.seasonal_period < 2 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be at least 2".to_string(),
            ));
        }
        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Validation fraction must be between 0 and 1".to_string(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Confidence level must be between 0 and 1".to_string(),
            ));
        }
        if !(self.disagreement_penalty >= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "Disagreement penalty must be non-negative".to_string(),
            ));
        }
        if self.max_fit_iterations == 0 {
            return Err(ForecastError::InvalidParameter(
                "At least one fit iteration is required".to_string(),
            ));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Changepoint range must be in (0, 1]".to_string(),
            ));
        }
        if !(self.changepoint_penalty >= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "Changepoint penalty must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
