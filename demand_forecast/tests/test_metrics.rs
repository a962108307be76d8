use approx::assert_relative_eq;
use demand_forecast::metrics::evaluate;

#[test]
fn test_perfect_forecast() {
    let metrics = evaluate(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(metrics.mae, 0.0);
    assert_eq!(metrics.rmse, 0.0);
    assert_eq!(metrics.mape, Some(0.0));
    assert_eq!(metrics.smape, 0.0);
    assert_eq!(metrics.count, 3);
}

#[test]
fn test_known_errors() {
    let metrics = evaluate(&[110.0, 90.0], &[100.0, 100.0]).unwrap();
    assert_relative_eq!(metrics.mae, 10.0);
    assert_relative_eq!(metrics.mse, 100.0);
    assert_relative_eq!(metrics.rmse, 10.0);
    assert_relative_eq!(metrics.mape.unwrap(), 10.0);
}

#[test]
fn test_zero_actuals_have_no_mape() {
    let metrics = evaluate(&[1.0, 1.0], &[0.0, 0.0]).unwrap();
    assert!(metrics.mape.is_none());
    assert_relative_eq!(metrics.smape, 200.0);
}

#[test]
fn test_missing_actuals_are_skipped() {
    let metrics = evaluate(&[1.0, 5.0], &[f64::NAN, 4.0]).unwrap();
    assert_eq!(metrics.count, 1);
    assert_relative_eq!(metrics.mae, 1.0);
}

#[test]
fn test_invalid_inputs() {
    assert!(evaluate(&[], &[]).is_err());
    assert!(evaluate(&[1.0], &[1.0, 2.0]).is_err());
    assert!(evaluate(&[f64::NAN], &[1.0]).is_err());
    assert!(evaluate(&[1.0], &[f64::NAN]).is_err());
}

#[test]
fn test_display() {
    let metrics = evaluate(&[2.0], &[1.0]).unwrap();
    let text = metrics.to_string();
    assert!(text.contains("MAE:   1.0000"));
    assert!(text.contains("MAPE:  100.0000%"));
}
