//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Error metrics for forecast evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, `None` when every actual is zero
    pub mape: Option<f64>,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
    /// Number of scored periods
    pub count: usize,
}

/// Calculate accuracy metrics for a forecast vs actual values.
///
/// Periods whose actual value is missing (non-finite) are skipped.
pub fn evaluate(forecast: &[f64], actual: &[f64]) -> Result<ErrorMetrics> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let pairs: Vec<(f64, f64)> = forecast
        .iter()
        .zip(actual.iter())
        .filter(|(_, a)| a.is_finite())
        .map(|(&f, &a)| (f, a))
        .collect();
    if pairs.is_empty() {
        return Err(ForecastError::InputError(
            "No observed values to score the forecast against".to_string(),
        ));
    }
    if pairs.iter().any(|(f, _)| !f.is_finite()) {
        return Err(ForecastError::InvalidParameter(
            "Forecast contains non-finite values".to_string(),
        ));
    }

    let n = pairs.len() as f64;
    let mae = pairs.iter().map(|(f, a)| (a - f).abs()).sum::<f64>() / n;
    let mse = pairs.iter().map(|(f, a)| (a - f).powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();

    let nonzero: Vec<&(f64, f64)> = pairs.iter().filter(|(_, a)| *a != 0.0).collect();
    let mape = if nonzero.is_empty() {
        None
    } else {
        Some(
            nonzero
                .iter()
                .map(|(f, a)| ((a - f) / a).abs() * 100.0)
                .sum::<f64>()
                / nonzero.len() as f64,
        )
    };

    let smape = pairs
        .iter()
        .map(|(f, a)| {
            let denom = a.abs() + f.abs();
            if denom == 0.0 {
                0.0
            } else {
                200.0 * (a - f).abs() / denom
            }
        })
        .sum::<f64>()
        / n;

    Ok(ErrorMetrics {
        mae,
        mse,
        rmse,
        mape,
        smape,
        count: pairs.len(),
    })
}

impl std::fmt::Display for ErrorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        match self.mape {
            Some(mape) => writeln!(f, "  MAPE:  {:.4}%", mape)?,
            None => writeln!(f, "  MAPE:  n/a")?,
        }
        writeln!(f, "  SMAPE: {:.4}%", self.smape)?;
        Ok(())
    }
}
