//! Centered moving average used to extract a trend cycle

use crate::{MathError, Result};

/// Centered moving average aligned with the input.
///
/// Odd periods use a symmetric window. Even periods use the `2 x period`
/// average (half weight on both end points) so the result stays centered.
/// Positions without a full window are `None`.
pub fn centered_moving_average(data: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    if period == 0 {
        return Err(MathError::InvalidInput(
            "Period must be greater than zero".to_string(),
        ));
    }
    let n = data.len();
    let half = period / 2;
    let mut out = vec![None; n];
    if n <= 2 * half {
        return Ok(out);
    }

    for (t, slot) in out.iter_mut().enumerate().take(n - half).skip(half) {
        let value = if period % 2 == 1 {
            data[t - half..=t + half].iter().sum::<f64>() / period as f64
        } else {
            let inner: f64 = data[t + 1 - half..t + half].iter().sum();
            (inner + 0.5 * (data[t - half] + data[t + half])) / period as f64
        };
        *slot = Some(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_moving_average_odd() {
        let cma = centered_moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(cma, vec![None, Some(2.0), Some(3.0), Some(4.0), None]);
    }

    #[test]
    fn test_centered_moving_average_even() {
        // a linear series is reproduced exactly by a centered average
        let data: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let cma = centered_moving_average(&data, 4).unwrap();
        assert_eq!(cma[1], None);
        assert_eq!(cma[2], Some(2.0));
        assert_eq!(cma[5], Some(5.0));
        assert_eq!(cma[6], None);
    }
}
