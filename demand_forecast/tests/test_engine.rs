use demand_forecast::{
    Confidence, ForecastConfig, ForecastEngine, ForecastError, ForecastMode, ForecastResult,
    ForecastWarning, ModelKind, Period, Series,
};
use rstest::rstest;
use std::f64::consts::PI;

fn monthly_volumes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|t| {
            let noise = ((t * 37 % 11) as f64 - 5.0) * 0.8;
            500.0 + 4.0 * t as f64 + 60.0 * (2.0 * PI * t as f64 / 12.0).sin() + noise
        })
        .collect()
}

fn monthly_series(id: &str, n: usize) -> Series {
    Series::from_volumes(id, Period(0), &monthly_volumes(n)).unwrap()
}

fn engine() -> ForecastEngine {
    ForecastEngine::new(ForecastConfig::default()).unwrap()
}

fn assert_bounds(result: &ForecastResult) {
    for point in &result.points {
        assert!(point.lower <= point.point, "{:?}", point);
        assert!(point.point <= point.upper, "{:?}", point);
    }
}

#[test]
fn test_seasonal_series_uses_both_models() {
    let series = monthly_series("sku", 48);
    let result = engine().forecast_horizon(&series, 6).unwrap();

    assert_eq!(result.series_id, "sku");
    assert_eq!(result.horizon, 6);
    assert_eq!(result.points.len(), 6);
    assert_eq!(result.points[0].period, Period(48));
    assert_eq!(result.mode, ForecastMode::Seasonal);
    assert_eq!(result.confidence, Confidence::Normal);
    assert_bounds(&result);

    let weights = result.weights();
    assert_eq!(weights.len(), 2);
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(result.ensemble_metrics.is_some());

    let decomposition = result.decomposition.as_ref().unwrap();
    assert!(decomposition.seasonal_strength > 0.5);
    assert!(decomposition.trend_slope > 0.0);
}

#[test]
fn test_short_history_degrades_to_trend_only() {
    let volumes = [120.0, 125.0, 123.0, 130.0, 134.0, 131.0, 138.0, 141.0];
    let series = Series::from_volumes("short", Period(0), &volumes).unwrap();
    let result = engine().forecast_horizon(&series, 4).unwrap();

    assert_ne!(result.mode, ForecastMode::Seasonal);
    assert!(result.is_degraded());
    assert!(result.decomposition.is_none());
    assert!(result.warnings.contains(&ForecastWarning::SeasonalitySkipped {
        history: 8,
        required: 24
    }));
    assert_eq!(result.points.len(), 4);
    assert_bounds(&result);
}

#[test]
fn test_missing_period_keeps_both_models() {
    let mut volumes = monthly_volumes(48);
    volumes[20] = f64::NAN;
    let series = Series::from_volumes("gappy", Period(0), &volumes).unwrap();
    let result = engine().forecast_horizon(&series, 3).unwrap();

    assert_eq!(result.mode, ForecastMode::Seasonal);
    let arima = result.model(ModelKind::SeasonalArima).unwrap();
    assert!(arima.excluded.is_none());
    assert!(arima.weight > 0.0);
    let trend = result.model(ModelKind::PiecewiseTrend).unwrap();
    assert!(trend.weight > 0.0);
    assert!(!result
        .warnings
        .iter()
        .any(|w| matches!(w, ForecastWarning::ModelExcluded { .. })));
    assert_bounds(&result);
}

#[test]
fn test_all_missing_history_is_input_error() {
    let series = Series::from_volumes("blank", Period(0), &[f64::NAN, f64::NAN]).unwrap();
    let err = engine().forecast_horizon(&series, 2).unwrap_err();
    assert!(matches!(err, ForecastError::InputError(_)));
}

#[test]
fn test_empty_series_is_input_error() {
    let series = Series::new("empty", Vec::new()).unwrap();
    let err = engine().forecast(&series).unwrap_err();
    assert!(err.is_input_error());
}

#[test]
fn test_forecast_is_deterministic() {
    let series = monthly_series("sku", 40);
    let first = engine().forecast_horizon(&series, 5).unwrap();
    let second = engine().forecast_horizon(&series, 5).unwrap();
    assert_eq!(first, second);
}

#[rstest]
#[case(1)]
#[case(12)]
#[case(24)]
fn test_horizon_lengths(#[case] horizon: usize) {
    let series = monthly_series("sku", 36);
    let result = engine().forecast_horizon(&series, horizon).unwrap();
    assert_eq!(result.points.len(), horizon);
    assert_bounds(&result);
}

#[test]
fn test_configured_horizon_is_default() {
    let config = ForecastConfig::default().with_horizon(3);
    let result = ForecastEngine::new(config)
        .unwrap()
        .forecast(&monthly_series("sku", 30))
        .unwrap();
    assert_eq!(result.points.len(), 3);
}

#[test]
fn test_invalid_config_rejected() {
    let config = ForecastConfig {
        confidence_level: 1.5,
        ..ForecastConfig::default()
    };
    assert!(ForecastEngine::new(config).is_err());
}

#[test]
fn test_result_serializes_to_json() {
    let result = engine()
        .forecast_horizon(&monthly_series("sku", 30), 2)
        .unwrap();
    let json = result.to_json().unwrap();
    assert!(json.contains("\"series_id\": \"sku\""));
    assert!(json.contains("\"points\""));
}
