//! In-sample accuracy of a fitted series

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Forecast accuracy metrics over the observed history
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error over non-zero actuals, in percent
    pub mape: Option<f64>,
}

/// Compare fitted values against the observations they were fitted to
pub fn fit_metrics(fitted: &[f64], actual: &[f64]) -> Result<FitMetrics> {
    if fitted.len() != actual.len() || fitted.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "Fitted and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = fitted.len() as f64;
    let errors: Vec<f64> = actual.iter().zip(fitted).map(|(a, f)| a - f).collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (errors.iter().map(|e| e.powi(2)).sum::<f64>() / n).sqrt();

    // Weeks with zero actual demand have no defined percentage error
    let percentage: Vec<f64> = actual
        .iter()
        .zip(&errors)
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, e)| e.abs() / a.abs() * 100.0)
        .collect();
    let mape = if percentage.is_empty() {
        None
    } else {
        Some(percentage.iter().sum::<f64>() / percentage.len() as f64)
    };

    Ok(FitMetrics { mae, rmse, mape })
}

impl std::fmt::Display for FitMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MAE {:.4}, RMSE {:.4}", self.mae, self.rmse)?;
        if let Some(mape) = self.mape {
            write!(f, ", MAPE {:.2}%", mape)?;
        }
        Ok(())
    }
}
