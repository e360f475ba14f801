use demand_forecast::error::ForecastError;
use demand_math::MathError;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);
    assert!(matches!(forecast_error, ForecastError::IoError(_)));

    let math_error = MathError::CalculationError("singular system".to_string());
    let forecast_error = ForecastError::from(math_error);
    assert!(matches!(forecast_error, ForecastError::Math(_)));

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(ForecastError::from(json_error), ForecastError::Json(_)));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InsufficientHistory {
        key: "Soup".to_string(),
        observations: 1,
    };
    let message = error.to_string();
    assert!(message.contains("Soup"));
    assert!(message.contains("1 usable observation"));

    let error = ForecastError::ForecastFailure {
        key: "onion".to_string(),
        reason: "singular system".to_string(),
    };
    assert_eq!(error.to_string(), "Forecast failed for 'onion': singular system");

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let message = ForecastError::from(io_error).to_string();
    assert!(message.contains("IO error"));
    assert!(message.contains("permission denied"));
}

#[test]
fn test_only_series_errors_are_recoverable() {
    let recoverable = [
        ForecastError::InsufficientHistory {
            key: "a".to_string(),
            observations: 0,
        },
        ForecastError::ForecastFailure {
            key: "a".to_string(),
            reason: "timed out".to_string(),
        },
        ForecastError::Render("disk full".to_string()),
    ];
    let fatal = [
        ForecastError::Input("missing column".to_string()),
        ForecastError::Fatal("nothing forecast".to_string()),
        ForecastError::InvalidParameter("top_n".to_string()),
    ];

    assert!(recoverable.iter().all(ForecastError::is_recoverable));
    assert!(!fatal.iter().any(ForecastError::is_recoverable));
}
