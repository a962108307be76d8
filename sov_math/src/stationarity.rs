//! Differencing and the augmented Dickey-Fuller unit-root test

use crate::regression::{least_squares, solve_linear_system};

/// MacKinnon asymptotic 5% critical value for the constant-only ADF regression
pub const ADF_CRITICAL_5PCT: f64 = -2.86;

/// Lag-`lag` difference, `x[t] - x[t - lag]`
pub fn difference(data: &[f64], lag: usize) -> Vec<f64> {
    if lag == 0 || data.len() <= lag {
        return Vec::new();
    }
    (lag..data.len()).map(|t| data[t] - data[t - lag]).collect()
}

/// Default number of augmenting lags for a sample of `n` points
pub fn default_adf_lags(n: usize) -> usize {
    ((n.saturating_sub(1)) as f64).cbrt().floor() as usize
}

/// ADF t-statistic for `H0: unit root` with a constant term.
///
/// Regresses `dy[t] = a + b * y[t-1] + sum(g_i * dy[t-i]) + e` and returns
/// `b / se(b)`. Returns `None` when the sample is too short for the
/// regression or the design is degenerate (for example a constant series).
pub fn adf_statistic(data: &[f64], lags: usize) -> Option<f64> {
    let diffs = difference(data, 1);
    let k = 2 + lags;
    // first usable row is at diffs index `lags`
    let n_reg = diffs.len().checked_sub(lags)?;
    if n_reg < k + 3 {
        return None;
    }

    let mut rows = Vec::with_capacity(n_reg);
    let mut y = Vec::with_capacity(n_reg);
    for t in lags..diffs.len() {
        let mut row = Vec::with_capacity(k);
        row.push(1.0);
        row.push(data[t]);
        for i in 1..=lags {
            row.push(diffs[t - i]);
        }
        rows.push(row);
        y.push(diffs[t]);
    }

    let beta = least_squares(&rows, &y).ok()?;
    let sse: f64 = rows
        .iter()
        .zip(&y)
        .map(|(row, target)| {
            let fitted: f64 = row.iter().zip(&beta).map(|(x, b)| x * b).sum();
            (target - fitted).powi(2)
        })
        .sum();
    let sigma2 = sse / (n_reg - k) as f64;

    let mut xtx = vec![vec![0.0; k]; k];
    for row in &rows {
        for i in 0..k {
            for j in 0..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    let mut unit = vec![0.0; k];
    unit[1] = 1.0;
    let column = solve_linear_system(xtx, unit).ok()?;
    let se = (sigma2 * column[1]).sqrt();
    if !se.is_finite() || se <= 0.0 {
        return None;
    }
    Some(beta[1] / se)
}

/// Whether the ADF test rejects a unit root at 5%. `None` if untestable.
pub fn is_stationary(data: &[f64]) -> Option<bool> {
    adf_statistic(data, default_adf_lags(data.len())).map(|stat| stat < ADF_CRITICAL_5PCT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(n: usize) -> Vec<f64> {
        // deterministic pseudo-noise in [-1, 1]
        let mut state: u64 = 42;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 31) as f64) * 2.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn test_difference() {
        assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 1), vec![2.0, 3.0, 4.0]);
        assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 2), vec![5.0, 7.0]);
        assert!(difference(&[1.0], 1).is_empty());
    }

    #[test]
    fn test_white_noise_is_stationary() {
        let data = noise(120);
        assert_eq!(is_stationary(&data), Some(true));
    }

    #[test]
    fn test_random_walk_is_not_stationary() {
        let steps = noise(120);
        let mut level = 100.0;
        let walk: Vec<f64> = steps
            .iter()
            .map(|s| {
                level += 5.0 + s;
                level
            })
            .collect();
        assert_eq!(is_stationary(&walk), Some(false));
    }

    #[test]
    fn test_short_series_is_untestable() {
        assert!(adf_statistic(&[1.0, 2.0, 3.0], 0).is_none());
        assert!(is_stationary(&[5.0; 30]).is_none());
    }
}
