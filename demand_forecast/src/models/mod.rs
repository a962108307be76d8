//! Forecasting models for demand series

use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate, ErrorMetrics};
use serde::Serialize;
use std::fmt::{self, Debug};

/// Point forecast with a symmetric interval per period
#[derive(Debug, Clone, PartialEq)]
pub struct ModelForecast {
    /// Forecasted values
    values: Vec<f64>,
    /// Lower/upper bounds per period
    intervals: Vec<(f64, f64)>,
}

impl ModelForecast {
    /// Create a forecast from values and interval half-widths
    pub fn from_half_widths(values: Vec<f64>, half_widths: &[f64]) -> Result<Self> {
        if values.len() != half_widths.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Values length ({}) doesn't match interval length ({})",
                values.len(),
                half_widths.len()
            )));
        }
        let intervals = values
            .iter()
            .zip(half_widths)
            .map(|(v, h)| {
                let h = h.max(0.0);
                (v - h, v + h)
            })
            .collect();
        Self::new_with_intervals(values, intervals)
    }

    /// Create a new forecast with explicit intervals
    pub fn new_with_intervals(values: Vec<f64>, intervals: Vec<(f64, f64)>) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "Forecast contains non-finite values".to_string(),
            ));
        }
        Ok(Self { values, intervals })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the interval bounds
    pub fn intervals(&self) -> &[(f64, f64)] {
        &self.intervals
    }

    /// Half the interval width per period
    pub fn half_widths(&self) -> Vec<f64> {
        self.intervals
            .iter()
            .map(|(lo, hi)| ((hi - lo) / 2.0).max(0.0))
            .collect()
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.values.len()
    }
}

/// Identifier of a forecasting technique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelKind {
    /// Differencing-based seasonal autoregressive model (Model A)
    SeasonalArima,
    /// Piecewise-linear trend with seasonal terms and changepoints (Model B)
    PiecewiseTrend,
    /// Seasonal-average fallback
    SeasonalNaive,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::SeasonalArima => "seasonal-arima",
            ModelKind::PiecewiseTrend => "piecewise-trend",
            ModelKind::SeasonalNaive => "seasonal-naive",
        };
        f.write_str(name)
    }
}

/// Holdout predictions and their error metrics
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub predictions: Vec<f64>,
    pub metrics: ErrorMetrics,
}

/// Model fitted to a concrete history
pub trait FittedModel: Debug + Send + Sync {
    /// Forecast `horizon` periods past the end of the fitted history
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ModelForecast>;

    /// Human-readable specification, e.g. the selected orders
    fn describe(&self) -> String;

    /// History indices where the model found a structural break
    fn changepoints(&self) -> Vec<usize> {
        Vec::new()
    }
}

/// Forecast model that can be fitted to a volume history
pub trait ForecastModel: Debug + Clone + Send + Sync {
    /// The type of fitted model produced
    type Fitted: FittedModel;

    /// Fit the model
    fn fit(&self, history: &[f64]) -> Result<Self::Fitted>;

    /// Technique implemented by this model
    fn kind(&self) -> ModelKind;

    /// Fit on `train`, forecast the holdout and score it
    fn validate(&self, train: &[f64], holdout: &[f64]) -> Result<Validation> {
        if holdout.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Validation needs a non-empty holdout".to_string(),
            ));
        }
        let fitted = self.fit(train)?;
        let forecast = fitted.forecast(holdout.len(), 0.95)?;
        let metrics = evaluate(forecast.values(), holdout)?;
        Ok(Validation {
            predictions: forecast.values().to_vec(),
            metrics,
        })
    }

    /// In-sample validation error of the model
    fn validation_error(&self, train: &[f64], holdout: &[f64]) -> Result<ErrorMetrics> {
        self.validate(train, holdout).map(|v| v.metrics)
    }
}

/// Full-history fit of one ensemble member
#[derive(Debug, Clone)]
pub struct MemberFit {
    pub forecast: ModelForecast,
    pub description: String,
    pub changepoints: Vec<usize>,
}

impl MemberFit {
    fn from_fitted<F: FittedModel>(fitted: F, horizon: usize, confidence_level: f64) -> Result<Self> {
        Ok(Self {
            forecast: fitted.forecast(horizon, confidence_level)?,
            description: fitted.describe(),
            changepoints: fitted.changepoints(),
        })
    }
}

/// Closed set of ensemble members
#[derive(Debug, Clone)]
pub enum Candidate {
    SeasonalArima(SeasonalArima),
    PiecewiseTrend(PiecewiseTrend),
}

impl Candidate {
    /// Technique of this member
    pub fn kind(&self) -> ModelKind {
        match self {
            Candidate::SeasonalArima(m) => m.kind(),
            Candidate::PiecewiseTrend(m) => m.kind(),
        }
    }

    /// Whether the member fits through missing periods itself
    pub fn tolerates_gaps(&self) -> bool {
        matches!(self, Candidate::PiecewiseTrend(_))
    }

    /// Score the member on a holdout
    pub fn validate(&self, train: &[f64], holdout: &[f64]) -> Result<Validation> {
        match self {
            Candidate::SeasonalArima(m) => m.validate(train, holdout),
            Candidate::PiecewiseTrend(m) => m.validate(train, holdout),
        }
    }

    /// Fit on the full history and forecast
    pub fn fit_forecast(
        &self,
        history: &[f64],
        horizon: usize,
        confidence_level: f64,
    ) -> Result<MemberFit> {
        match self {
            Candidate::SeasonalArima(m) => {
                MemberFit::from_fitted(m.fit(history)?, horizon, confidence_level)
            }
            Candidate::PiecewiseTrend(m) => {
                MemberFit::from_fitted(m.fit(history)?, horizon, confidence_level)
            }
        }
    }
}

pub mod naive;
pub mod piecewise_trend;
pub mod sarima;

pub use naive::SeasonalNaive;
pub use piecewise_trend::PiecewiseTrend;
pub use sarima::SeasonalArima;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_from_half_widths() {
        let f = ModelForecast::from_half_widths(vec![10.0, 12.0], &[1.0, -3.0]).unwrap();
        assert_eq!(f.intervals(), &[(9.0, 11.0), (12.0, 12.0)]);
        assert_eq!(f.half_widths(), vec![1.0, 0.0]);
        assert_eq!(f.horizons(), 2);
    }

    #[test]
    fn test_forecast_rejects_mismatch_and_nan() {
        assert!(ModelForecast::from_half_widths(vec![1.0], &[]).is_err());
        assert!(ModelForecast::from_half_widths(vec![f64::NAN], &[1.0]).is_err());
    }
}
