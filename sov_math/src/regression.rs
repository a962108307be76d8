//! Least squares estimation
//!
//! Contains:
//! - Simple linear regression for trend slopes
//! - Multivariate ordinary / ridge least squares via the normal equations

use crate::{MathError, Result};

/// Simple linear regression of values against their index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    slope: f64,
    intercept: f64,
    r_squared: Option<f64>,
    len: usize,
}

impl LinearRegression {
    /// Fit `y = intercept + slope * x` with `x = 0, 1, 2, ...`
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(MathError::InsufficientData(
                "Not enough data for linear regression. Need at least 2 points.".to_string(),
            ));
        }

        let n = values.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = values.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, &y) in values.iter().enumerate() {
            let x = i as f64;
            numerator += (x - x_mean) * (y - y_mean);
            denominator += (x - x_mean) * (x - x_mean);
        }

        if denominator.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = numerator / denominator;
        let intercept = y_mean - slope * x_mean;

        let mut ss_total = 0.0;
        let mut ss_residual = 0.0;
        for (i, &y) in values.iter().enumerate() {
            let y_pred = slope * i as f64 + intercept;
            ss_total += (y - y_mean).powi(2);
            ss_residual += (y - y_pred).powi(2);
        }
        let r_squared = if ss_total.abs() < 1e-10 {
            None
        } else {
            Some(1.0 - ss_residual / ss_total)
        };

        Ok(Self {
            slope,
            intercept,
            r_squared,
            len: values.len(),
        })
    }

    /// Trend per period
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Fitted value at index 0
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Coefficient of determination, `None` for a constant series
    pub fn r_squared(&self) -> Option<f64> {
        self.r_squared
    }

    /// Predict the value `periods_ahead` steps past the last fitted point
    pub fn forecast(&self, periods_ahead: usize) -> f64 {
        let x = (self.len + periods_ahead - 1) as f64;
        self.slope * x + self.intercept
    }
}

/// Solve `(X'X + diag(penalty)) b = X'y` for `b`.
///
/// `rows` is the design matrix in row-major order. `penalty` holds one
/// non-negative ridge weight per column; pass zeros for plain OLS.
pub fn ridge_least_squares(rows: &[Vec<f64>], y: &[f64], penalty: &[f64]) -> Result<Vec<f64>> {
    if rows.is_empty() || rows.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Design matrix has {} rows but response has {} values",
            rows.len(),
            y.len()
        )));
    }
    let k = rows[0].len();
    if k == 0 || penalty.len() != k || rows.iter().any(|r| r.len() != k) {
        return Err(MathError::InvalidInput(
            "Design matrix rows and penalty must share the same column count".to_string(),
        ));
    }
    if rows.len() < k {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} observations for {} coefficients, have {}",
            k,
            k,
            rows.len()
        )));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in rows.iter().zip(y) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in i..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
        xtx[i][i] += penalty[i];
    }

    solve_linear_system(xtx, xty)
}

/// Ordinary least squares, `ridge_least_squares` with a zero penalty
pub fn least_squares(rows: &[Vec<f64>], y: &[f64]) -> Result<Vec<f64>> {
    let k = rows.first().map(Vec::len).unwrap_or(0);
    ridge_least_squares(rows, y, &vec![0.0; k])
}

/// Gaussian elimination with partial pivoting
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "Linear system must be square".to_string(),
        ));
    }

    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= 1e-12 * scale {
            return Err(MathError::SingularMatrix(format!(
                "Pivot for column {} is zero",
                col
            )));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|c| a[row][c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Solution contains non-finite values".to_string(),
        ));
    }
    Ok(x)
}
