//! Utility functions for the demand_forecast crate

use crate::data::Period;

/// Shortest history that still leaves three training points after the split
const MIN_SPLIT_HISTORY: usize = 4;

/// Number of trailing periods held out for validation.
///
/// The fraction is clamped to 10-20% and the holdout keeps at least three
/// training points. Histories shorter than four periods get no holdout.
pub fn validation_len(n: usize, fraction: f64) -> usize {
    if n < MIN_SPLIT_HISTORY {
        return 0;
    }
    let len = (n as f64 * fraction.clamp(0.1, 0.2)).round() as usize;
    len.max(1).min(n - 3)
}

/// Split a history into training and validation slices
pub fn train_validation_split(data: &[f64], fraction: f64) -> (&[f64], &[f64]) {
    let holdout = validation_len(data.len(), fraction);
    data.split_at(data.len() - holdout)
}

/// Periods following `last`
pub fn future_periods(last: Period, horizon: usize) -> Vec<Period> {
    (1..=horizon as i64).map(|h| last.offset(h)).collect()
}

/// Replace missing (non-finite) values with the previous observed value.
///
/// Leading gaps take the first observed value. Returns `None` when nothing
/// is observed.
pub fn fill_missing(data: &[f64]) -> Option<Vec<f64>> {
    let first = data.iter().copied().find(|v| v.is_finite())?;
    let mut last = first;
    Some(
        data.iter()
            .map(|&v| {
                if v.is_finite() {
                    last = v;
                }
                last
            })
            .collect(),
    )
}
