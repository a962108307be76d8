//! Descriptive statistics and two-sample tests
//!
//! Contains:
//! - Mean, sample variance and standard deviation
//! - Zero-variance detection
//! - Welch's unequal-variance t-test

use crate::{MathError, Result};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Relative tolerance below which a sample is treated as constant
pub const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance (n - 1 denominator)
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    Some(ss / (values.len() - 1) as f64)
}

/// Population variance (n denominator)
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let ss = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    Some(ss / values.len() as f64)
}

/// Sample standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// True when every value equals the mean up to a scale-aware tolerance.
///
/// Samples with fewer than two values have no measurable spread and are
/// reported as constant.
pub fn is_constant(values: &[f64]) -> bool {
    match (mean(values), population_variance(values)) {
        (Some(m), Some(var)) if values.len() >= 2 => {
            let scale = m.abs().max(1.0);
            var.sqrt() <= ZERO_VARIANCE_TOLERANCE * scale
        }
        _ => true,
    }
}

/// Two-sided quantile of the standard normal for a confidence level in (0, 1)
pub fn normal_quantile(confidence_level: f64) -> Result<f64> {
    if confidence_level <= 0.0 || confidence_level >= 1.0 {
        return Err(MathError::InvalidInput(
            "Confidence level must be between 0 and 1 (exclusive)".to_string(),
        ));
    }
    let normal =
        Normal::new(0.0, 1.0).map_err(|e| MathError::CalculationError(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + confidence_level / 2.0))
}

/// Outcome of Welch's t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WelchTest {
    /// Difference of means (first sample minus second)
    pub mean_difference: f64,
    /// Standard error of the difference
    pub standard_error: f64,
    /// t statistic
    pub t_statistic: f64,
    /// Welch-Satterthwaite degrees of freedom
    pub degrees_of_freedom: f64,
    /// Two-sided p-value
    pub p_value: f64,
}

/// Welch's unequal-variance t-test between two samples.
///
/// Fails when either sample has fewer than two values or when both
/// samples are constant (the statistic is undefined).
pub fn welch_t_test(first: &[f64], second: &[f64]) -> Result<WelchTest> {
    let (n1, n2) = (first.len() as f64, second.len() as f64);
    let (v1, v2) = match (sample_variance(first), sample_variance(second)) {
        (Some(v1), Some(v2)) => (v1, v2),
        _ => {
            return Err(MathError::InsufficientData(
                "Welch's t-test needs at least two values per sample".to_string(),
            ))
        }
    };
    let m1 = mean(first).unwrap_or_default();
    let m2 = mean(second).unwrap_or_default();

    let a = v1 / n1;
    let b = v2 / n2;
    let se = (a + b).sqrt();
    if !se.is_finite() || se <= 0.0 {
        return Err(MathError::CalculationError(
            "Standard error of the difference is zero".to_string(),
        ));
    }

    let df = (a + b).powi(2) / (a.powi(2) / (n1 - 1.0) + b.powi(2) / (n2 - 1.0));
    let t = (m1 - m2) / se;
    let dist =
        StudentsT::new(0.0, 1.0, df).map_err(|e| MathError::CalculationError(e.to_string()))?;
    let p_value = (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0);

    Ok(WelchTest {
        mean_difference: m1 - m2,
        standard_error: se,
        t_statistic: t,
        degrees_of_freedom: df,
        p_value,
    })
}
