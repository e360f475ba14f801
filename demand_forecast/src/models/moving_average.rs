//! Moving average model for weekly demand
//!
//! Each history point is fitted with the mean of the preceding `window`
//! observations (the first point with itself); future weeks repeat the mean
//! of the last `window` observations.

use super::{future_dates, require_history, Deadline, ForecastModel, ForecastPoint, ForecastResult, ModelConfig};
use crate::error::{ForecastError, Result};
use crate::series::Series;
use demand_math::stats;
use tracing::debug;

/// Simple Moving Average model
#[derive(Debug, Clone)]
pub struct MovingAverageModel {
    /// Window size
    window: usize,
}

impl MovingAverageModel {
    /// Create a new moving average model
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Window size must be positive".to_string(),
            ));
        }

        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Mean of up to `window` values ending just before `end`
    fn trailing_mean(&self, values: &[f64], end: usize) -> f64 {
        let start = end.saturating_sub(self.window);
        let slice = &values[start..end];
        slice.iter().sum::<f64>() / slice.len() as f64
    }
}

impl ForecastModel for MovingAverageModel {
    fn fit(&self, series: &Series, config: &ModelConfig) -> Result<ForecastResult> {
        config.validate()?;
        require_history(series)?;

        let deadline = Deadline::start(config.fit_timeout);
        let key = series.key();

        let (dates, values): (Vec<_>, Vec<f64>) = series
            .dates()
            .iter()
            .copied()
            .zip(series.values().iter().copied())
            .filter(|(_, v)| v.is_finite())
            .unzip();

        let mut fitted = Vec::with_capacity(values.len());
        fitted.push(values[0]);
        for i in 1..values.len() {
            deadline.check(key)?;
            fitted.push(self.trailing_mean(&values, i));
        }

        let sigma = stats::residual_std_dev(&values, &fitted, 1)?;
        let z = config.z_score()?;
        let n = values.len() as f64;
        let band = |steps_ahead: usize| z * sigma * (1.0 + steps_ahead as f64 / n).sqrt();

        let mut points: Vec<ForecastPoint> = dates
            .iter()
            .zip(values.iter().zip(&fitted))
            .map(|(date, (value, estimate))| ForecastPoint {
                date: *date,
                estimate: *estimate,
                lower: estimate - band(0),
                upper: estimate + band(0),
                observed: Some(*value),
            })
            .collect();

        let level = self.trailing_mean(&values, values.len());
        // require_history guarantees a non-empty history
        let last = dates[dates.len() - 1];
        for (step, date) in future_dates(last, config.future_periods)?.into_iter().enumerate() {
            let width = band(step + 1);
            points.push(ForecastPoint {
                date,
                estimate: level,
                lower: level - width,
                upper: level + width,
                observed: None,
            });
        }

        debug!(key, window = self.window, level, sigma, "Fitted moving average");
        ForecastResult::new(key, self.name(), points, values.len())
    }

    fn name(&self) -> &str {
        "moving_average"
    }
}
