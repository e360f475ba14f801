//! Exponential smoothing model backed by `augurs`
//!
//! Fits a non-seasonal AutoETS model (error and trend components chosen by
//! information criterion) to the finite observations of a series. The fitted
//! history comes from the in-sample predictions and the future points from
//! the model forecast, both with prediction intervals at `interval_width`.

use super::{future_dates, require_history, Deadline, ForecastModel, ForecastPoint, ForecastResult, ModelConfig};
use crate::error::{ForecastError, Result};
use crate::series::Series;
use augurs::ets::AutoETS;
use augurs::prelude::*;
use augurs::Forecast;
use demand_math::stats;
use tracing::debug;

/// Fewest observations AutoETS is given
pub const MIN_ETS_OBSERVATIONS: usize = 3;

/// Exponential smoothing (AutoETS) model
#[derive(Debug, Clone, Default)]
pub struct EtsModel;

impl EtsModel {
    pub fn new() -> Self {
        Self
    }
}

/// Point estimates with a band that always contains them. Missing or
/// non-finite interval bounds fall back to `estimate ± fallback(i)`.
fn banded(forecast: &Forecast, fallback: impl Fn(usize) -> f64) -> Vec<(f64, f64, f64)> {
    forecast
        .point
        .iter()
        .enumerate()
        .map(|(i, &estimate)| {
            let bounds = forecast
                .intervals
                .as_ref()
                .and_then(|iv| Some((*iv.lower.get(i)?, *iv.upper.get(i)?)))
                .filter(|(lo, hi)| lo.is_finite() && hi.is_finite());
            let (lower, upper) = bounds.unwrap_or_else(|| {
                let width = fallback(i);
                (estimate - width, estimate + width)
            });
            (estimate, lower.min(estimate), upper.max(estimate))
        })
        .collect()
}

impl ForecastModel for EtsModel {
    fn fit(&self, series: &Series, config: &ModelConfig) -> Result<ForecastResult> {
        config.validate()?;
        require_history(series)?;

        let deadline = Deadline::start(config.fit_timeout);
        let key = series.key();
        let failure = |stage: &str, err: String| ForecastError::ForecastFailure {
            key: key.to_string(),
            reason: format!("ETS {}: {}", stage, err),
        };

        let (dates, values): (Vec<_>, Vec<f64>) = series
            .dates()
            .iter()
            .copied()
            .zip(series.values().iter().copied())
            .filter(|(_, v)| v.is_finite())
            .unzip();

        if values.len() < MIN_ETS_OBSERVATIONS {
            return Err(ForecastError::InsufficientHistory {
                key: key.to_string(),
                observations: values.len(),
            });
        }

        let fitted = AutoETS::non_seasonal()
            .fit(&values)
            .map_err(|e| failure("fit", e.to_string()))?;
        deadline.check(key)?;

        let in_sample = fitted
            .predict_in_sample(config.interval_width)
            .map_err(|e| failure("in-sample prediction", e.to_string()))?;
        let ahead = fitted
            .predict(config.future_periods, config.interval_width)
            .map_err(|e| failure("prediction", e.to_string()))?;
        deadline.check(key)?;

        if in_sample.point.len() != values.len() || ahead.point.len() != config.future_periods {
            return Err(failure(
                "prediction",
                format!(
                    "expected {} fitted and {} future point(s), got {} and {}",
                    values.len(),
                    config.future_periods,
                    in_sample.point.len(),
                    ahead.point.len()
                ),
            ));
        }

        let sigma = stats::residual_std_dev(&values, &in_sample.point, 2)?;
        let z = config.z_score()?;
        let n = values.len() as f64;

        let mut points: Vec<ForecastPoint> = dates
            .iter()
            .zip(&values)
            .zip(banded(&in_sample, |_| z * sigma))
            .map(|((date, value), (estimate, lower, upper))| ForecastPoint {
                date: *date,
                estimate,
                lower,
                upper,
                observed: Some(*value),
            })
            .collect();

        // require_history guarantees a non-empty history
        let last = dates[dates.len() - 1];
        let future = future_dates(last, config.future_periods)?;
        let band = banded(&ahead, |step| z * sigma * (1.0 + (step + 1) as f64 / n).sqrt());
        for (date, (estimate, lower, upper)) in future.into_iter().zip(band) {
            points.push(ForecastPoint {
                date,
                estimate,
                lower,
                upper,
                observed: None,
            });
        }

        debug!(key, sigma, observations = values.len(), "Fitted ETS");
        ForecastResult::new(key, self.name(), points, values.len())
    }

    fn name(&self) -> &str {
        "ets"
    }
}
