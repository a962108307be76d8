//! Classical additive decomposition: `Y = T + S + R`

use crate::moving_averages::centered_moving_average;
use crate::regression::LinearRegression;
use crate::stats::population_variance;
use crate::{MathError, Result};
use serde::Serialize;

/// Decomposed time series components, aligned with the input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    pub period: usize,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    /// One seasonal index per position in the cycle, summing to zero
    pub seasonal_indices: Vec<f64>,
}

impl Decomposition {
    /// Seasonal index for absolute position `t` (0 = first observation)
    pub fn seasonal_at(&self, t: usize) -> f64 {
        self.seasonal_indices[t % self.period]
    }

    /// Trend slope per period from a straight-line fit of the trend cycle
    pub fn trend_slope(&self) -> f64 {
        LinearRegression::fit(&self.trend)
            .map(|lr| lr.slope())
            .unwrap_or(0.0)
    }

    /// Standard deviation of the seasonal component
    pub fn seasonal_amplitude(&self) -> f64 {
        population_variance(&self.seasonal)
            .map(f64::sqrt)
            .unwrap_or(0.0)
    }

    /// Strength of seasonality, `max(0, 1 - Var(R) / Var(S + R))`.
    ///
    /// Close to 1 for a dominant seasonal pattern, 0 when the seasonal
    /// component explains nothing beyond noise.
    pub fn seasonal_strength(&self) -> f64 {
        let combined: Vec<f64> = self
            .seasonal
            .iter()
            .zip(&self.residual)
            .map(|(s, r)| s + r)
            .collect();
        match (
            population_variance(&self.residual),
            population_variance(&combined),
        ) {
            (Some(var_r), Some(var_sr)) if var_sr > 0.0 => (1.0 - var_r / var_sr).max(0.0),
            _ => 0.0,
        }
    }
}

/// Perform additive decomposition with the given seasonal period.
///
/// Requires at least two full cycles. The trend is a centered moving
/// average, extended flat into the edges where the window is incomplete.
pub fn decompose_additive(data: &[f64], period: usize) -> Result<Decomposition> {
    if period < 2 {
        return Err(MathError::InvalidInput(
            "Seasonal period must be at least 2".to_string(),
        ));
    }
    let n = data.len();
    if n < 2 * period {
        return Err(MathError::InsufficientData(format!(
            "Decomposition needs two full cycles ({} values), have {}",
            2 * period,
            n
        )));
    }

    let cma = centered_moving_average(data, period)?;
    let first = cma.iter().position(Option::is_some);
    let last = cma.iter().rposition(Option::is_some);
    let (first, last) = match (first, last) {
        (Some(f), Some(l)) => (f, l),
        _ => {
            return Err(MathError::InsufficientData(
                "Centered moving average is empty".to_string(),
            ))
        }
    };

    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (t, value) in cma.iter().enumerate() {
        if let Some(trend) = value {
            sums[t % period] += data[t] - trend;
            counts[t % period] += 1;
        }
    }
    let mut indices: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let offset = indices.iter().sum::<f64>() / period as f64;
    indices.iter_mut().for_each(|s| *s -= offset);

    let trend: Vec<f64> = cma
        .iter()
        .enumerate()
        .map(|(t, value)| match value {
            Some(v) => *v,
            None if t < first => cma[first].unwrap_or_default(),
            None => cma[last].unwrap_or_default(),
        })
        .collect();
    let seasonal: Vec<f64> = (0..n).map(|t| indices[t % period]).collect();
    let residual: Vec<f64> = data
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((d, t), s)| d - t - s)
        .collect();

    Ok(Decomposition {
        period,
        trend,
        seasonal,
        residual,
        seasonal_indices: indices,
    })
}
