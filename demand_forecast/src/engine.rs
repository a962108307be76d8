//! Ensemble forecasting engine

use crate::config::ForecastConfig;
use crate::data::{Period, Series};
use crate::ensemble::{combine, inverse_error_weights, weighted_points};
use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate, ErrorMetrics};
use crate::models::{
    Candidate, FittedModel, ForecastModel, MemberFit, ModelForecast, ModelKind, PiecewiseTrend,
    SeasonalArima, SeasonalNaive, Validation,
};
use crate::utils::{fill_missing, future_periods, train_validation_split};
use rayon::prelude::*;
use serde::Serialize;
use sov_math::decomposition::decompose_additive;
use std::fmt;
use tracing::{debug, info, warn};

/// How much of the model structure the history supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForecastMode {
    /// Seasonal decomposition and seasonal model terms
    Seasonal,
    /// History shorter than the seasonal threshold
    TrendOnly,
    /// Every ensemble member failed
    Naive,
}

/// Confidence flag attached to a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    Normal,
    Degraded,
}

/// Recovered conditions surfaced with a forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ForecastWarning {
    /// History too short for seasonal terms
    SeasonalitySkipped { history: usize, required: usize },
    /// Member dropped from the ensemble
    ModelExcluded { model: ModelKind, reason: String },
    /// Seasonal-average fallback used
    NaiveFallback,
    /// History too short for a validation holdout
    NoValidationSplit { history: usize },
}

impl fmt::Display for ForecastWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastWarning::SeasonalitySkipped { history, required } => write!(
                f,
                "seasonality skipped: {} periods of history, {} required",
                history, required
            ),
            ForecastWarning::ModelExcluded { model, reason } => {
                write!(f, "{} excluded: {}", model, reason)
            }
            ForecastWarning::NaiveFallback => write!(f, "all models failed, naive forecast used"),
            ForecastWarning::NoValidationSplit { history } => {
                write!(f, "{} periods are too few for a validation split", history)
            }
        }
    }
}

/// One forecast period
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub period: Period,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Per-model outcome inside an ensemble forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub model: ModelKind,
    /// Selected specification, e.g. `SARIMA(1,1,0)(0,1,0)[12]`
    pub description: Option<String>,
    pub weight: f64,
    /// Holdout error metrics
    pub validation: Option<ErrorMetrics>,
    /// Reason the model was dropped
    pub excluded: Option<String>,
}

/// Shape of the history behind a forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecompositionSummary {
    /// Trend change per period
    pub trend_slope: f64,
    /// Standard deviation of the seasonal component
    pub seasonal_amplitude: f64,
    /// Seasonality strength in [0, 1]
    pub seasonal_strength: f64,
}

/// Ensembled forecast for one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub series_id: String,
    pub horizon: usize,
    pub points: Vec<ForecastPoint>,
    pub models: Vec<ModelReport>,
    pub ensemble_metrics: Option<ErrorMetrics>,
    pub mode: ForecastMode,
    pub confidence: Confidence,
    pub warnings: Vec<ForecastWarning>,
    pub decomposition: Option<DecompositionSummary>,
    /// Periods where the trend model found a slope change
    pub changepoints: Vec<Period>,
}

impl ForecastResult {
    /// Ensemble weight of each model, in model order
    pub fn weights(&self) -> Vec<(ModelKind, f64)> {
        self.models.iter().map(|m| (m.model, m.weight)).collect()
    }

    /// Report for one model
    pub fn model(&self, kind: ModelKind) -> Option<&ModelReport> {
        self.models.iter().find(|m| m.model == kind)
    }

    pub fn is_degraded(&self) -> bool {
        self.confidence == Confidence::Degraded
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Outcome of scoring and refitting one member
#[derive(Debug)]
struct MemberOutcome {
    kind: ModelKind,
    result: Result<(Validation, MemberFit)>,
}

/// Engine producing ensembled forecasts
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    /// Create an engine, rejecting invalid configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast the configured horizon
    pub fn forecast(&self, series: &Series) -> Result<ForecastResult> {
        self.forecast_horizon(series, self.config.horizon)
    }

    /// Forecast `horizon` periods past the end of the series
    pub fn forecast_horizon(&self, series: &Series, horizon: usize) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InputError(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        let last = series.last_period().ok_or_else(|| {
            ForecastError::InputError(format!("Series '{}' is empty", series.id()))
        })?;
        let history = series.volumes();
        let filled = fill_missing(&history).ok_or_else(|| {
            ForecastError::InputError(format!("Series '{}' has no observed volume", series.id()))
        })?;

        let n = history.len();
        let required = self.config.min_seasonal_history();
        let mut warnings = Vec::new();
        let mut mode = if n >= required {
            ForecastMode::Seasonal
        } else {
            warnings.push(ForecastWarning::SeasonalitySkipped {
                history: n,
                required,
            });
            ForecastMode::TrendOnly
        };
        let seasonal = mode == ForecastMode::Seasonal;

        let decomposition = if seasonal {
            decompose_additive(&filled, self.config.seasonal_period)
                .ok()
                .map(|d| DecompositionSummary {
                    trend_slope: d.trend_slope(),
                    seasonal_amplitude: d.seasonal_amplitude(),
                    seasonal_strength: d.seasonal_strength(),
                })
        } else {
            None
        };

        let (train, holdout) = train_validation_split(&history, self.config.validation_fraction);
        let (forecast, models, ensemble_metrics, changepoints) = if holdout.is_empty() {
            warnings.push(ForecastWarning::NoValidationSplit { history: n });
            mode = ForecastMode::Naive;
            self.naive(&history, None, horizon)?
        } else {
            match self.ensemble(seasonal, &history, &filled, horizon, &mut warnings)? {
                Some(ensembled) => ensembled,
                None => {
                    warnings.push(ForecastWarning::NaiveFallback);
                    mode = ForecastMode::Naive;
                    self.naive(&history, Some((train, holdout)), horizon)?
                }
            }
        };

        let confidence = if mode == ForecastMode::Seasonal {
            Confidence::Normal
        } else {
            Confidence::Degraded
        };

        let points = future_periods(last, horizon)
            .into_iter()
            .zip(forecast.values())
            .zip(forecast.intervals())
            .map(|((period, &point), &(lower, upper))| ForecastPoint {
                period,
                point,
                lower,
                upper,
            })
            .collect();

        let first = series.first_period().unwrap_or(last);
        let result = ForecastResult {
            series_id: series.id().to_string(),
            horizon,
            points,
            models,
            ensemble_metrics,
            mode,
            confidence,
            warnings,
            decomposition,
            changepoints: changepoints
                .into_iter()
                .map(|t| first.offset(t as i64))
                .collect(),
        };

        info!(
            series = %result.series_id,
            horizon,
            mode = ?result.mode,
            warnings = result.warnings.len(),
            "forecast complete"
        );
        Ok(result)
    }

    fn candidates(&self, seasonal: bool) -> Vec<Candidate> {
        vec![
            Candidate::SeasonalArima(SeasonalArima::from_config(&self.config, seasonal)),
            Candidate::PiecewiseTrend(PiecewiseTrend::from_config(&self.config, seasonal)),
        ]
    }

    /// Weighted ensemble of the surviving members, `None` if every member failed.
    ///
    /// Members that cannot skip missing periods see the interpolated history.
    #[allow(clippy::type_complexity)]
    fn ensemble(
        &self,
        seasonal: bool,
        history: &[f64],
        filled: &[f64],
        horizon: usize,
        warnings: &mut Vec<ForecastWarning>,
    ) -> Result<Option<(ModelForecast, Vec<ModelReport>, Option<ErrorMetrics>, Vec<usize>)>> {
        let level = self.config.confidence_level;
        let fraction = self.config.validation_fraction;
        let (_, holdout) = train_validation_split(history, fraction);
        let outcomes: Vec<MemberOutcome> = self
            .candidates(seasonal)
            .par_iter()
            .map(|candidate| {
                let input = if candidate.tolerates_gaps() { history } else { filled };
                let (train, holdout) = train_validation_split(input, fraction);
                MemberOutcome {
                    kind: candidate.kind(),
                    result: candidate.validate(train, holdout).and_then(|validation| {
                        let fit = candidate.fit_forecast(input, horizon, level)?;
                        Ok((validation, fit))
                    }),
                }
            })
            .collect();

        let mut reports = Vec::with_capacity(outcomes.len());
        let mut survivors = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok((validation, fit)) => {
                    reports.push(ModelReport {
                        model: outcome.kind,
                        description: Some(fit.description.clone()),
                        weight: 0.0,
                        validation: Some(validation.metrics),
                        excluded: None,
                    });
                    survivors.push((reports.len() - 1, validation, fit));
                }
                Err(e) => {
                    warn!(model = %outcome.kind, error = %e, "model excluded from ensemble");
                    warnings.push(ForecastWarning::ModelExcluded {
                        model: outcome.kind,
                        reason: e.to_string(),
                    });
                    reports.push(ModelReport {
                        model: outcome.kind,
                        description: None,
                        weight: 0.0,
                        validation: None,
                        excluded: Some(e.to_string()),
                    });
                }
            }
        }
        if survivors.is_empty() {
            return Ok(None);
        }

        let errors: Vec<f64> = survivors.iter().map(|(_, v, _)| v.metrics.rmse).collect();
        let weights = inverse_error_weights(&errors);
        if weights.is_empty() {
            return Ok(None);
        }
        for ((index, _, _), weight) in survivors.iter().zip(&weights) {
            reports[*index].weight = *weight;
        }
        debug!(?weights, "ensemble weights");

        let validation_points: Vec<(f64, &[f64])> = survivors
            .iter()
            .zip(&weights)
            .map(|((_, v, _), w)| (*w, v.predictions.as_slice()))
            .collect();
        let ensemble_metrics = weighted_points(&validation_points)
            .and_then(|points| evaluate(&points, holdout))
            .ok();

        let members: Vec<(f64, &ModelForecast)> = survivors
            .iter()
            .zip(&weights)
            .map(|((_, _, fit), w)| (*w, &fit.forecast))
            .collect();
        let forecast = combine(&members, self.config.disagreement_penalty)?;

        let changepoints = survivors
            .iter()
            .flat_map(|(_, _, fit)| fit.changepoints.iter().copied())
            .collect();

        Ok(Some((forecast, reports, ensemble_metrics, changepoints)))
    }

    #[allow(clippy::type_complexity)]
    fn naive(
        &self,
        history: &[f64],
        split: Option<(&[f64], &[f64])>,
        horizon: usize,
    ) -> Result<(ModelForecast, Vec<ModelReport>, Option<ErrorMetrics>, Vec<usize>)> {
        let model = SeasonalNaive::new(self.config.seasonal_period);
        let validation = split.and_then(|(train, holdout)| model.validate(train, holdout).ok());
        let fitted = model.fit(history)?;
        let forecast = fitted.forecast(horizon, self.config.confidence_level)?;
        let metrics = validation.map(|v| v.metrics);
        let report = ModelReport {
            model: model.kind(),
            description: Some(fitted.describe()),
            weight: 1.0,
            validation: metrics,
            excluded: None,
        };
        Ok((forecast, vec![report], metrics, Vec::new()))
    }
}
