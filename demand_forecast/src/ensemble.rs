//! Inverse-error weighting and interval pooling across ensemble members

use crate::error::{ForecastError, Result};
use crate::models::ModelForecast;

/// Validation errors below this are treated as this value
pub const MIN_VALIDATION_ERROR: f64 = 1e-9;

/// Weights `w_i = (1/e_i) / sum(1/e_j)` from validation errors.
///
/// Non-finite errors get weight zero. Returns an empty vector when no
/// member has a usable error.
pub fn inverse_error_weights(errors: &[f64]) -> Vec<f64> {
    let inverse: Vec<f64> = errors
        .iter()
        .map(|e| {
            if e.is_finite() {
                1.0 / e.max(MIN_VALIDATION_ERROR)
            } else {
                0.0
            }
        })
        .collect();
    let total: f64 = inverse.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }
    inverse.iter().map(|w| w / total).collect()
}

/// Weighted point per period
pub fn weighted_points(members: &[(f64, &[f64])]) -> Result<Vec<f64>> {
    let horizon = members.first().map(|(_, v)| v.len()).unwrap_or(0);
    if members.iter().any(|(_, v)| v.len() != horizon) {
        return Err(ForecastError::InvalidParameter(
            "Ensemble members must forecast the same horizon".to_string(),
        ));
    }
    Ok((0..horizon)
        .map(|h| members.iter().map(|(w, v)| w * v[h]).sum())
        .collect())
}

/// Combine member forecasts into the ensemble forecast.
///
/// The half-width is the weighted member half-width plus
/// `disagreement_penalty` times half the spread of member points.
pub fn combine(members: &[(f64, &ModelForecast)], disagreement_penalty: f64) -> Result<ModelForecast> {
    if members.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "Ensemble needs at least one member".to_string(),
        ));
    }
    let points: Vec<(f64, &[f64])> = members.iter().map(|(w, f)| (*w, f.values())).collect();
    let values = weighted_points(&points)?;

    let member_widths: Vec<Vec<f64>> = members.iter().map(|(_, f)| f.half_widths()).collect();
    let half_widths: Vec<f64> = (0..values.len())
        .map(|h| {
            let pooled: f64 = members
                .iter()
                .zip(&member_widths)
                .map(|((w, _), widths)| w * widths[h])
                .sum();
            let (low, high) = members.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, (_, f)| {
                (acc.0.min(f.values()[h]), acc.1.max(f.values()[h]))
            });
            (pooled + disagreement_penalty * (high - low) / 2.0).max(0.0)
        })
        .collect();

    ModelForecast::from_half_widths(values, &half_widths)
}
