//! Piecewise-linear trend with Fourier seasonality (Model B).
//!
//! The trend is a line with hinge terms at evenly spaced candidate
//! changepoints. A ridge penalty on the hinge slopes keeps the trend from
//! bending at every candidate, so only changepoints the data supports end
//! up with a material slope change.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::models::{FittedModel, ForecastModel, ModelForecast, ModelKind};
use sov_math::regression::ridge_least_squares;
use sov_math::stats::{mean, normal_quantile, std_dev};
use std::f64::consts::PI;
use tracing::debug;

const MODEL_NAME: &str = "piecewise-trend";
const MIN_POINTS: usize = 3;
/// Slope changes below this share of the series' standard deviation are not reported
const CHANGEPOINT_THRESHOLD: f64 = 0.1;

/// Piecewise trend model
#[derive(Debug, Clone)]
pub struct PiecewiseTrend {
    seasonal_period: usize,
    seasonal: bool,
    changepoints: usize,
    changepoint_range: f64,
    changepoint_penalty: f64,
    fourier_order: usize,
}

impl PiecewiseTrend {
    /// Create a model with default trend settings
    pub fn new(seasonal_period: usize) -> Self {
        Self::from_config(
            &ForecastConfig::default().with_seasonal_period(seasonal_period),
            true,
        )
    }

    /// Build from the engine configuration
    pub fn from_config(config: &ForecastConfig, seasonal: bool) -> Self {
        Self {
            seasonal_period: config.seasonal_period,
            seasonal,
            changepoints: config.changepoints,
            changepoint_range: config.changepoint_range,
            changepoint_penalty: config.changepoint_penalty,
            fourier_order: config.fourier_order,
        }
    }

    /// Drop the Fourier terms
    pub fn non_seasonal(mut self) -> Self {
        self.seasonal = false;
        self
    }

    /// Set the number of candidate changepoints
    pub fn with_changepoints(mut self, changepoints: usize) -> Self {
        self.changepoints = changepoints;
        self
    }
}

/// Shape of the regression design
#[derive(Debug, Clone, PartialEq)]
struct Design {
    /// Changepoint locations on the scaled time axis
    changepoints: Vec<f64>,
    fourier_order: usize,
    period: usize,
    /// Last index of the fitted history, maps `t` to `t / span`
    span: f64,
}

impl Design {
    fn columns(&self) -> usize {
        2 + self.changepoints.len() + 2 * self.fourier_order
    }

    fn row(&self, t: usize) -> Vec<f64> {
        let tau = t as f64 / self.span;
        let mut row = Vec::with_capacity(self.columns());
        row.push(1.0);
        row.push(tau);
        row.extend(self.changepoints.iter().map(|c| (tau - c).max(0.0)));
        for k in 1..=self.fourier_order {
            let angle = 2.0 * PI * k as f64 * t as f64 / self.period as f64;
            row.push(angle.sin());
            row.push(angle.cos());
        }
        row
    }

    fn penalty(&self, strength: f64) -> Vec<f64> {
        let mut penalty = vec![0.0; self.columns()];
        for p in penalty.iter_mut().skip(2).take(self.changepoints.len()) {
            *p = strength;
        }
        penalty
    }
}

/// Piecewise trend fitted to a history
#[derive(Debug, Clone)]
pub struct FittedPiecewiseTrend {
    design: Design,
    coefficients: Vec<f64>,
    location: f64,
    scale: f64,
    sigma: f64,
    n: usize,
}

impl FittedPiecewiseTrend {
    /// Periods (indices into the history) with a material slope change
    pub fn detected_changepoints(&self) -> Vec<usize> {
        let deltas = &self.coefficients[2..2 + self.design.changepoints.len()];
        self.design
            .changepoints
            .iter()
            .zip(deltas)
            .filter(|(_, delta)| delta.abs() >= CHANGEPOINT_THRESHOLD)
            .map(|(c, _)| (c * self.design.span).round() as usize)
            .collect()
    }

    /// Residual standard deviation in volume units
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Overall trend slope per period in volume units, ignoring changepoints
    pub fn base_slope(&self) -> f64 {
        self.coefficients[1] * self.scale / self.design.span
    }
}

impl ForecastModel for PiecewiseTrend {
    type Fitted = FittedPiecewiseTrend;

    fn fit(&self, history: &[f64]) -> Result<FittedPiecewiseTrend> {
        let observed: Vec<(usize, f64)> = history
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .collect();
        if history.len() < MIN_POINTS || observed.len() < MIN_POINTS {
            return Err(ForecastError::model_fit(
                MODEL_NAME,
                format!(
                    "need at least {} observed values, have {}",
                    MIN_POINTS,
                    observed.len()
                ),
            ));
        }

        let values: Vec<f64> = observed.iter().map(|(_, v)| *v).collect();
        let location = mean(&values).unwrap_or(0.0);
        let scale = std_dev(&values)
            .filter(|sd| *sd > f64::EPSILON)
            .unwrap_or(1.0);

        let mut fourier_order =
            if self.seasonal && self.seasonal_period >= 3 && history.len() >= self.seasonal_period {
                self.fourier_order.min((self.seasonal_period - 1) / 2)
            } else {
                0
            };
        let mut changepoints = self.changepoints;
        // keep at least one residual degree of freedom
        while 2 + changepoints + 2 * fourier_order >= observed.len() {
            if changepoints > 0 {
                changepoints -= 1;
            } else if fourier_order > 0 {
                fourier_order -= 1;
            } else {
                break;
            }
        }

        let design = Design {
            changepoints: (1..=changepoints)
                .map(|j| self.changepoint_range * j as f64 / changepoints as f64)
                .collect(),
            fourier_order,
            period: self.seasonal_period.max(1),
            span: (history.len() - 1) as f64,
        };

        let rows: Vec<Vec<f64>> = observed.iter().map(|(t, _)| design.row(*t)).collect();
        let target: Vec<f64> = values.iter().map(|v| (v - location) / scale).collect();
        let coefficients = ridge_least_squares(
            &rows,
            &target,
            &design.penalty(self.changepoint_penalty),
        )
        .map_err(|e| ForecastError::model_fit(MODEL_NAME, e.to_string()))?;

        let sse: f64 = rows
            .iter()
            .zip(&target)
            .map(|(row, y)| {
                let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
                (y - fitted).powi(2)
            })
            .sum();
        let dof = (observed.len() - design.columns()).max(1) as f64;
        let sigma = (sse / dof).sqrt() * scale;

        let fitted = FittedPiecewiseTrend {
            design,
            coefficients,
            location,
            scale,
            sigma,
            n: history.len(),
        };
        debug!(
            changepoints = changepoints,
            fourier_order = fourier_order,
            detected = fitted.detected_changepoints().len(),
            "fitted piecewise trend"
        );
        Ok(fitted)
    }

    fn kind(&self) -> ModelKind {
        ModelKind::PiecewiseTrend
    }
}

impl FittedModel for FittedPiecewiseTrend {
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ModelForecast> {
        let quantile = normal_quantile(confidence_level)?;
        let n = self.n as f64;

        let values: Vec<f64> = (self.n..self.n + horizon)
            .map(|t| {
                let standardized: f64 = self
                    .design
                    .row(t)
                    .iter()
                    .zip(&self.coefficients)
                    .map(|(x, b)| x * b)
                    .sum();
                self.location + self.scale * standardized
            })
            .collect();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::model_fit(
                MODEL_NAME,
                "forecast produced non-finite values",
            ));
        }

        let half_widths: Vec<f64> = (0..horizon)
            .map(|h| quantile * self.sigma * (1.0 + (h + 1) as f64 / n).sqrt())
            .collect();
        ModelForecast::from_half_widths(values, &half_widths)
    }

    fn describe(&self) -> String {
        format!(
            "piecewise-trend(changepoints={}, fourier={})",
            self.design.changepoints.len(),
            self.design.fourier_order
        )
    }

    fn changepoints(&self) -> Vec<usize> {
        self.detected_changepoints()
    }
}
