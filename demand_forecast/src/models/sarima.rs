//! Seasonal ARIMA with automatic order selection.
//!
//! The differencing orders come from the data: one seasonal difference when
//! the decomposition shows strong seasonality, then regular differences
//! until the augmented Dickey-Fuller test rejects a unit root. The ARMA
//! orders are chosen by AIC over a small grid, each candidate estimated
//! with the two-stage Hannan-Rissanen regression.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::models::{FittedModel, ForecastModel, ModelForecast, ModelKind};
use rayon::prelude::*;
use sov_math::decomposition::decompose_additive;
use sov_math::regression::least_squares;
use sov_math::stationarity::{difference, is_stationary};
use sov_math::stats::{is_constant, mean, normal_quantile};
use tracing::debug;

const MODEL_NAME: &str = "seasonal-arima";

/// Seasonal strength above which one seasonal difference is taken
const SEASONAL_DIFFERENCE_THRESHOLD: f64 = 0.64;
const MAX_P: usize = 2;
const MAX_Q: usize = 1;
const MAX_SEASONAL_P: usize = 1;
const MAX_D: usize = 2;
const MIN_POINTS: usize = 3;
const SIGMA2_FLOOR: f64 = 1e-10;
/// Forecasts beyond this multiple of the largest observation are divergent
const DIVERGENCE_FACTOR: f64 = 1e6;
/// MA coefficients are kept inside the invertible region
const MAX_MA_COEFFICIENT: f64 = 0.98;

/// Autoregressive and moving-average orders of one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOrder {
    pub p: usize,
    pub q: usize,
    pub seasonal_p: usize,
}

/// Seasonal ARIMA model (Model A)
#[derive(Debug, Clone)]
pub struct SeasonalArima {
    seasonal_period: usize,
    seasonal: bool,
    max_fit_iterations: usize,
}

impl SeasonalArima {
    /// Create a model with seasonal terms enabled
    pub fn new(seasonal_period: usize, max_fit_iterations: usize) -> Self {
        Self {
            seasonal_period,
            seasonal: true,
            max_fit_iterations,
        }
    }

    /// Build from the engine configuration
    pub fn from_config(config: &ForecastConfig, seasonal: bool) -> Self {
        Self {
            seasonal_period: config.seasonal_period,
            seasonal,
            max_fit_iterations: config.max_fit_iterations,
        }
    }

    /// Disable the seasonal difference and seasonal AR term
    pub fn non_seasonal(mut self) -> Self {
        self.seasonal = false;
        self
    }

    /// Candidate orders in search order, capped at `max_fit_iterations`
    pub fn candidate_orders(&self, allow_seasonal_ar: bool) -> Vec<ArimaOrder> {
        let max_seasonal_p = if allow_seasonal_ar { MAX_SEASONAL_P } else { 0 };
        let mut orders = Vec::new();
        for seasonal_p in 0..=max_seasonal_p {
            for p in 0..=MAX_P {
                for q in 0..=MAX_Q {
                    orders.push(ArimaOrder { p, q, seasonal_p });
                }
            }
        }
        orders.truncate(self.max_fit_iterations.max(1));
        orders
    }
}

/// Values preceding one differencing step, needed to undo it
#[derive(Debug, Clone)]
struct DifferenceStage {
    lag: usize,
    tail: Vec<f64>,
}

/// Undo the differencing stages, last stage first.
///
/// With `zero_tail` the stages start from zeros, which turns an impulse
/// response of the differenced series into one of the original series.
fn integrate(values: &[f64], stages: &[DifferenceStage], zero_tail: bool) -> Vec<f64> {
    let mut out = values.to_vec();
    for stage in stages.iter().rev() {
        let mut extended = if zero_tail {
            vec![0.0; stage.lag]
        } else {
            stage.tail.clone()
        };
        for &v in &out {
            let previous = extended[extended.len() - stage.lag];
            extended.push(v + previous);
        }
        out = extended.split_off(stage.lag);
    }
    out
}

/// Estimated ARMA coefficients for one order
#[derive(Debug, Clone)]
struct ArmaFit {
    order: ArimaOrder,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: f64,
    residuals: Vec<f64>,
    sigma2: f64,
    aic: f64,
}

impl ArmaFit {
    fn one_step(&self, z: &[f64], e: &[f64], t: usize, period: usize) -> f64 {
        let mut prediction = 0.0;
        for (i, phi) in self.ar.iter().enumerate() {
            if t > i {
                prediction += phi * z[t - 1 - i];
            }
        }
        if self.order.seasonal_p > 0 && t >= period {
            prediction += self.seasonal_ar * z[t - period];
        }
        for (j, theta) in self.ma.iter().enumerate() {
            if t > j {
                prediction += theta * e[t - 1 - j];
            }
        }
        prediction
    }
}

/// Residuals of a long autoregression, used as innovation estimates
fn long_ar_residuals(z: &[f64], order: ArimaOrder) -> Option<(Vec<f64>, usize)> {
    let n = z.len();
    let m = ((n as f64).ln().ceil() as usize)
        .max(order.p + order.q + 1)
        .min(n / 3);
    if m == 0 || n < 2 * m + 2 {
        return None;
    }
    let rows: Vec<Vec<f64>> = (m..n)
        .map(|t| (1..=m).map(|i| z[t - i]).collect())
        .collect();
    let phi = least_squares(&rows, &z[m..]).ok()?;
    let mut residuals = vec![0.0; n];
    for (t, row) in (m..n).zip(&rows) {
        let fitted: f64 = row.iter().zip(&phi).map(|(x, b)| x * b).sum();
        residuals[t] = z[t] - fitted;
    }
    Some((residuals, m))
}

/// Hannan-Rissanen estimate of one candidate, `None` when it cannot be fitted
fn fit_arma(z: &[f64], order: ArimaOrder, period: usize, extra_params: usize) -> Option<ArmaFit> {
    let n = z.len();
    let k = order.p + order.q + order.seasonal_p;

    let mut fit = ArmaFit {
        order,
        ar: Vec::new(),
        ma: Vec::new(),
        seasonal_ar: 0.0,
        residuals: Vec::new(),
        sigma2: 0.0,
        aic: f64::INFINITY,
    };

    if k > 0 {
        let (innovations, long_lag) = if order.q > 0 {
            long_ar_residuals(z, order)?
        } else {
            (vec![0.0; n], 0)
        };
        let start = order
            .p
            .max(order.seasonal_p * period)
            .max(if order.q > 0 { long_lag + order.q } else { 0 });
        if n < start + k + 2 {
            return None;
        }
        let rows: Vec<Vec<f64>> = (start..n)
            .map(|t| {
                let mut row = Vec::with_capacity(k);
                row.extend((1..=order.p).map(|i| z[t - i]));
                row.extend((1..=order.q).map(|j| innovations[t - j]));
                if order.seasonal_p > 0 {
                    row.push(z[t - period]);
                }
                row
            })
            .collect();
        let beta = least_squares(&rows, &z[start..]).ok()?;
        fit.ar = beta[..order.p].to_vec();
        fit.ma = beta[order.p..order.p + order.q]
            .iter()
            .map(|theta| theta.clamp(-MAX_MA_COEFFICIENT, MAX_MA_COEFFICIENT))
            .collect();
        if order.seasonal_p > 0 {
            fit.seasonal_ar = beta[order.p + order.q];
        }
    }

    // conditional sum of squares
    let start = order.p.max(order.seasonal_p * period);
    if n < start + 2 {
        return None;
    }
    let mut residuals = vec![0.0; n];
    for t in start..n {
        let prediction = fit.one_step(z, &residuals, t, period);
        residuals[t] = z[t] - prediction;
    }
    let effective = (n - start) as f64;
    let sse: f64 = residuals[start..].iter().map(|e| e * e).sum();
    if !sse.is_finite() {
        return None;
    }
    fit.sigma2 = (sse / effective).max(SIGMA2_FLOOR);
    fit.aic = effective * fit.sigma2.ln() + 2.0 * (k + 1 + extra_params) as f64;
    fit.residuals = residuals;
    Some(fit)
}

/// Seasonal ARIMA fitted to a history
#[derive(Debug, Clone)]
pub struct FittedSeasonalArima {
    arma: ArmaFit,
    period: usize,
    regular_d: usize,
    seasonal_d: usize,
    mean: f64,
    centered: Vec<f64>,
    stages: Vec<DifferenceStage>,
    scale: f64,
}

impl FittedSeasonalArima {
    /// Selected ARMA orders
    pub fn order(&self) -> ArimaOrder {
        self.arma.order
    }

    /// Regular and seasonal differencing orders `(d, D)`
    pub fn differencing(&self) -> (usize, usize) {
        (self.regular_d, self.seasonal_d)
    }

    /// Innovation variance
    pub fn sigma2(&self) -> f64 {
        self.arma.sigma2
    }

    /// Akaike information criterion of the selected order
    pub fn aic(&self) -> f64 {
        self.arma.aic
    }

    /// Impulse response of the integrated process, `psi_0 = 1`
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let mut shock = vec![0.0; horizon];
        if let Some(first) = shock.first_mut() {
            *first = 1.0;
        }
        let mut response = vec![0.0; horizon];
        for t in 0..horizon {
            response[t] = shock[t] + self.arma.one_step(&response, &shock, t, self.period);
        }
        integrate(&response, &self.stages, true)
    }
}

impl ForecastModel for SeasonalArima {
    type Fitted = FittedSeasonalArima;

    fn fit(&self, history: &[f64]) -> Result<FittedSeasonalArima> {
        if history.len() < MIN_POINTS {
            return Err(ForecastError::model_fit(
                MODEL_NAME,
                format!(
                    "need at least {} observations, have {}",
                    MIN_POINTS,
                    history.len()
                ),
            ));
        }
        if history.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::model_fit(
                MODEL_NAME,
                "history contains missing or non-finite values",
            ));
        }

        let period = self.seasonal_period;
        let seasonal = self.seasonal && period >= 2 && history.len() >= 2 * period;
        let mut stages = Vec::new();
        let mut series = history.to_vec();

        let mut seasonal_d = 0;
        if seasonal && history.len() >= period + MIN_POINTS {
            let strength = decompose_additive(history, period)
                .map(|d| d.seasonal_strength())
                .unwrap_or(0.0);
            if strength > SEASONAL_DIFFERENCE_THRESHOLD {
                stages.push(DifferenceStage {
                    lag: period,
                    tail: series[series.len() - period..].to_vec(),
                });
                series = difference(&series, period);
                seasonal_d = 1;
            }
        }

        let mut regular_d = 0;
        while regular_d < MAX_D && !is_constant(&series) {
            match is_stationary(&series) {
                Some(true) => break,
                Some(false) => {}
                // untestable series get a single difference
                None if regular_d > 0 => break,
                None => {}
            }
            if series.len() <= MIN_POINTS {
                break;
            }
            stages.push(DifferenceStage {
                lag: 1,
                tail: vec![series[series.len() - 1]],
            });
            series = difference(&series, 1);
            regular_d += 1;
        }

        let include_mean = regular_d + seasonal_d <= 1;
        let level = if include_mean {
            mean(&series).unwrap_or(0.0)
        } else {
            0.0
        };
        let centered: Vec<f64> = series.iter().map(|v| v - level).collect();

        let allow_seasonal_ar = seasonal && centered.len() >= 2 * period + MIN_POINTS;
        let orders = self.candidate_orders(allow_seasonal_ar);
        let extra_params = usize::from(include_mean);
        let fits: Vec<Option<ArmaFit>> = orders
            .par_iter()
            .map(|&order| fit_arma(&centered, order, period, extra_params))
            .collect();

        // ties keep the earlier grid entry
        let mut best: Option<ArmaFit> = None;
        for fit in fits.into_iter().flatten() {
            if best.as_ref().map_or(true, |b| fit.aic < b.aic) {
                best = Some(fit);
            }
        }
        let arma = best.ok_or_else(|| {
            ForecastError::model_fit(MODEL_NAME, "no candidate order could be estimated")
        })?;

        debug!(
            p = arma.order.p,
            d = regular_d,
            q = arma.order.q,
            seasonal_p = arma.order.seasonal_p,
            seasonal_d,
            aic = arma.aic,
            "selected ARIMA order"
        );

        let scale = history
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
            .max(1.0);

        Ok(FittedSeasonalArima {
            arma,
            period,
            regular_d,
            seasonal_d,
            mean: level,
            centered,
            stages,
            scale,
        })
    }

    fn kind(&self) -> ModelKind {
        ModelKind::SeasonalArima
    }
}

impl FittedModel for FittedSeasonalArima {
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ModelForecast> {
        let quantile = normal_quantile(confidence_level)?;

        let n = self.centered.len();
        let mut z = self.centered.clone();
        let mut e = self.arma.residuals.clone();
        for t in n..n + horizon {
            let prediction = self.arma.one_step(&z, &e, t, self.period);
            z.push(prediction);
            e.push(0.0);
        }
        let differenced: Vec<f64> = z[n..].iter().map(|v| v + self.mean).collect();
        let values = integrate(&differenced, &self.stages, false);

        if values
            .iter()
            .any(|v| !v.is_finite() || v.abs() > DIVERGENCE_FACTOR * self.scale)
        {
            return Err(ForecastError::model_fit(
                MODEL_NAME,
                format!("forecast diverged for {}", self.describe()),
            ));
        }

        let mut cumulative = 0.0;
        let half_widths: Vec<f64> = self
            .psi_weights(horizon)
            .iter()
            .map(|psi| {
                cumulative += psi * psi;
                quantile * (self.arma.sigma2 * cumulative).sqrt()
            })
            .collect();

        ModelForecast::from_half_widths(values, &half_widths)
    }

    fn describe(&self) -> String {
        let order = self.arma.order;
        format!(
            "SARIMA({},{},{})({},{},0)[{}]",
            order.p, self.regular_d, order.q, order.seasonal_p, self.seasonal_d, self.period
        )
    }
}
