use demand_forecast::ForecastError;
use sov_math::MathError;

#[test]
fn test_error_messages() {
    let err = ForecastError::InputError("empty series".to_string());
    assert_eq!(err.to_string(), "Input error: empty series");

    let err = ForecastError::model_fit("seasonal-arima", "diverged");
    assert_eq!(
        err.to_string(),
        "Model fit error (seasonal-arima): diverged"
    );
}

#[test]
fn test_conversions() {
    let err: ForecastError = MathError::SingularMatrix("pivot".to_string()).into();
    assert!(matches!(err, ForecastError::MathError(_)));

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: ForecastError = io.into();
    assert!(matches!(err, ForecastError::IoError(_)));
}

#[test]
fn test_input_error_classification() {
    assert!(ForecastError::InputError("x".into()).is_input_error());
    assert!(ForecastError::ParseError("x".into()).is_input_error());
    assert!(!ForecastError::model_fit("m", "r").is_input_error());
}
