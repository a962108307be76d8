//! Seasonal-average fallback used when neither ensemble member is usable

use crate::error::{ForecastError, Result};
use crate::models::{FittedModel, ForecastModel, ModelForecast, ModelKind};
use sov_math::stats::{mean, normal_quantile};

const MODEL_NAME: &str = "seasonal-naive";
/// Observations averaged when the history is shorter than one cycle
const RECENT_WINDOW: usize = 3;

/// Seasonal naive model
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    seasonal_period: usize,
}

impl SeasonalNaive {
    /// Create a new seasonal naive model
    pub fn new(seasonal_period: usize) -> Self {
        Self { seasonal_period }
    }
}

/// Per-position averages of a history
#[derive(Debug, Clone)]
pub struct FittedSeasonalNaive {
    /// Forecast for each position in the cycle
    levels: Vec<f64>,
    n: usize,
    sigma: f64,
}

impl ForecastModel for SeasonalNaive {
    type Fitted = FittedSeasonalNaive;

    fn fit(&self, history: &[f64]) -> Result<FittedSeasonalNaive> {
        let observed: Vec<f64> = history.iter().copied().filter(|v| v.is_finite()).collect();
        if observed.is_empty() {
            return Err(ForecastError::model_fit(
                MODEL_NAME,
                "history has no observed values",
            ));
        }
        let recent_start = observed.len().saturating_sub(RECENT_WINDOW);
        let recent = mean(&observed[recent_start..]).unwrap_or(0.0);

        let period = self.seasonal_period.max(1);
        let levels = if history.len() >= period && period > 1 {
            (0..period)
                .map(|position| {
                    let values: Vec<f64> = history
                        .iter()
                        .skip(position)
                        .step_by(period)
                        .copied()
                        .filter(|v| v.is_finite())
                        .collect();
                    mean(&values).unwrap_or(recent)
                })
                .collect()
        } else {
            vec![recent]
        };

        // in-sample errors of predicting each value by the previous one
        let errors: Vec<f64> = observed.windows(2).map(|w| w[1] - w[0]).collect();
        let sigma = if errors.is_empty() {
            0.0
        } else {
            (errors.iter().map(|e| e * e).sum::<f64>() / errors.len() as f64).sqrt()
        };

        Ok(FittedSeasonalNaive {
            levels,
            n: history.len(),
            sigma,
        })
    }

    fn kind(&self) -> ModelKind {
        ModelKind::SeasonalNaive
    }
}

impl FittedModel for FittedSeasonalNaive {
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ModelForecast> {
        let quantile = normal_quantile(confidence_level)?;
        let period = self.levels.len();
        let values: Vec<f64> = (self.n..self.n + horizon)
            .map(|t| self.levels[t % period])
            .collect();
        let half_widths: Vec<f64> = (0..horizon)
            .map(|h| quantile * self.sigma * ((1 + h) as f64).sqrt())
            .collect();
        ModelForecast::from_half_widths(values, &half_widths)
    }

    fn describe(&self) -> String {
        format!("seasonal-naive(period={})", self.levels.len())
    }
}
