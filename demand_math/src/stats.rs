//! Descriptive statistics over plain slices

use crate::{MathError, Result};

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty slice".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(
            "Need at least 2 values for a sample standard deviation".to_string(),
        ));
    }

    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;

    Ok(variance.sqrt())
}

/// Residual standard deviation of a fit using `parameters` degrees of freedom.
///
/// The denominator never drops below one, so an exactly determined fit
/// yields zero rather than a division error.
pub fn residual_std_dev(observed: &[f64], fitted: &[f64], parameters: usize) -> Result<f64> {
    if observed.len() != fitted.len() {
        return Err(MathError::InvalidInput(format!(
            "Observed ({}) and fitted ({}) lengths differ",
            observed.len(),
            fitted.len()
        )));
    }
    if observed.is_empty() {
        return Err(MathError::InsufficientData(
            "No residuals to summarise".to_string(),
        ));
    }

    let sse: f64 = observed
        .iter()
        .zip(fitted)
        .map(|(o, f)| (o - f).powi(2))
        .sum();
    let dof = observed.len().saturating_sub(parameters).max(1);

    Ok((sse / dof as f64).sqrt())
}
