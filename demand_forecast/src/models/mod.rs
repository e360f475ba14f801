//! Forecasting models for weekly demand series
//!
//! Every model implements [`ForecastModel`]: it takes one [`Series`] and a
//! [`ModelConfig`] and returns a [`ForecastResult`] covering the observed
//! history plus the requested number of future weeks. A model value only
//! carries configuration; coefficients live for the duration of one `fit`
//! call, so fits of different series never share state.

use crate::error::{ForecastError, Result};
use crate::metrics::{fit_metrics, FitMetrics};
use crate::series::Series;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::time::Instant;

pub mod additive;
pub mod ets;
pub mod moving_average;

pub use additive::AdditiveModel;
pub use ets::EtsModel;
pub use moving_average::MovingAverageModel;

/// Minimum number of distinct usable observations for any fit
pub const MIN_OBSERVATIONS: usize = 2;

/// Whether a seasonal component is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalityOption {
    /// Decide from the span of the history
    Auto,
    On,
    Off,
}

/// Configuration shared by all models
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Number of future weekly points to generate
    pub future_periods: usize,
    /// Coverage of the uncertainty band, in (0, 1)
    pub interval_width: f64,
    pub weekly_seasonality: bool,
    pub daily_seasonality: bool,
    pub yearly_seasonality: SeasonalityOption,
    /// Larger values let seasonal terms move further from zero
    pub seasonality_prior_scale: f64,
    /// Wall-clock budget for one series fit
    pub fit_timeout: Option<std::time::Duration>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            future_periods: 1,
            interval_width: 0.95,
            weekly_seasonality: true,
            daily_seasonality: false,
            yearly_seasonality: SeasonalityOption::Auto,
            seasonality_prior_scale: 10.0,
            fit_timeout: None,
        }
    }
}

impl ModelConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.future_periods == 0 {
            return Err(ForecastError::InvalidParameter(
                "future_periods must be at least 1".to_string(),
            ));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be between 0 and 1, got {}",
                self.interval_width
            )));
        }
        if !(self.seasonality_prior_scale > 0.0) || !self.seasonality_prior_scale.is_finite() {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonality_prior_scale must be positive, got {}",
                self.seasonality_prior_scale
            )));
        }
        Ok(())
    }

    /// Two-sided standard normal quantile for `interval_width`
    pub fn z_score(&self) -> Result<f64> {
        self.validate()?;
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
        Ok(normal.inverse_cdf(0.5 + self.interval_width / 2.0))
    }
}

/// Wall-clock budget for a single fit
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Option<std::time::Duration>,
}

impl Deadline {
    /// Start the clock now
    pub fn start(budget: Option<std::time::Duration>) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    /// Fail the fit of `key` once the budget is spent
    pub fn check(&self, key: &str) -> Result<()> {
        match self.budget {
            Some(budget) if self.started.elapsed() > budget => {
                Err(ForecastError::ForecastFailure {
                    key: key.to_string(),
                    reason: format!("fit exceeded its {:?} deadline", budget),
                })
            }
            _ => Ok(()),
        }
    }
}

/// One dated point of a forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Point estimate
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
    /// Observed value, for history points
    pub observed: Option<f64>,
}

/// Forecast for one series: fitted history followed by future points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    key: String,
    model: String,
    points: Vec<ForecastPoint>,
    history_len: usize,
    metrics: Option<FitMetrics>,
}

impl ForecastResult {
    /// Create a forecast result.
    ///
    /// The first `history_len` points are the fitted history; at least one
    /// future point must follow.
    pub fn new(key: &str, model: &str, points: Vec<ForecastPoint>, history_len: usize) -> Result<Self> {
        if points.len() <= history_len {
            return Err(ForecastError::ForecastFailure {
                key: key.to_string(),
                reason: format!(
                    "{} point(s) for a history of {}; no future point",
                    points.len(),
                    history_len
                ),
            });
        }
        if let Some(bad) = points
            .iter()
            .find(|p| !(p.lower <= p.estimate && p.estimate <= p.upper))
        {
            return Err(ForecastError::ForecastFailure {
                key: key.to_string(),
                reason: format!(
                    "band [{}, {}] does not contain estimate {} at {}",
                    bad.lower, bad.upper, bad.estimate, bad.date
                ),
            });
        }
        if points.windows(2).any(|w| w[0].date >= w[1].date) {
            return Err(ForecastError::ForecastFailure {
                key: key.to_string(),
                reason: "forecast dates are not strictly increasing".to_string(),
            });
        }

        let (fitted, actual): (Vec<f64>, Vec<f64>) = points[..history_len]
            .iter()
            .filter_map(|p| p.observed.map(|o| (p.estimate, o)))
            .unzip();
        let metrics = fit_metrics(&fitted, &actual).ok();

        Ok(Self {
            key: key.to_string(),
            model: model.to_string(),
            points,
            history_len,
            metrics,
        })
    }

    /// Grouping key the forecast belongs to
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Name of the model that produced it
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Fitted points over the observed history
    pub fn history(&self) -> &[ForecastPoint] {
        &self.points[..self.history_len]
    }

    /// Extrapolated points
    pub fn future(&self) -> &[ForecastPoint] {
        &self.points[self.history_len..]
    }

    /// The last point: the estimate used for the next planning period
    pub fn next_period(&self) -> &ForecastPoint {
        // `new` guarantees at least one future point
        &self.points[self.points.len() - 1]
    }

    /// In-sample accuracy, when the history had observations
    pub fn metrics(&self) -> Option<&FitMetrics> {
        self.metrics.as_ref()
    }
}

/// Forecast model that fits one series at a time
pub trait ForecastModel: Debug + Send + Sync {
    /// Fit the series and forecast `config.future_periods` weeks past its end
    fn fit(&self, series: &Series, config: &ModelConfig) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Weekly dates following `last`
pub fn future_dates(last: NaiveDate, periods: usize) -> Result<Vec<NaiveDate>> {
    (1..=periods as i64)
        .map(|k| {
            Duration::try_weeks(k)
                .and_then(|offset| last.checked_add_signed(offset))
                .ok_or_else(|| {
                    ForecastError::InvalidParameter(format!(
                        "Cannot extend {} by {} week(s)",
                        last, k
                    ))
                })
        })
        .collect()
}

/// Fail with `InsufficientHistory` unless the series has enough distinct
/// finite observations
pub fn require_history(series: &Series) -> Result<()> {
    let distinct: BTreeSet<NaiveDate> = series
        .dates()
        .iter()
        .zip(series.values())
        .filter(|(_, v)| v.is_finite())
        .map(|(d, _)| *d)
        .collect();

    if distinct.len() < MIN_OBSERVATIONS {
        return Err(ForecastError::InsufficientHistory {
            key: series.key().to_string(),
            observations: distinct.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, estimate: f64, lower: f64, upper: f64) -> ForecastPoint {
        ForecastPoint {
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            estimate,
            lower,
            upper,
            observed: Some(estimate),
        }
    }

    #[test]
    fn test_z_score_for_95_percent() {
        let z = ModelConfig::default().z_score().unwrap();
        assert!((z - 1.96).abs() < 1e-2);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ModelConfig::default();
        config.interval_width = 1.0;
        assert!(config.validate().is_err());

        let mut config = ModelConfig::default();
        config.future_periods = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_result_requires_future_point() {
        let points = vec![point(1, 1.0, 0.5, 1.5)];
        assert!(ForecastResult::new("k", "m", points.clone(), 1).is_err());
        assert!(ForecastResult::new("k", "m", points, 0).is_ok());
    }

    #[test]
    fn test_result_rejects_inverted_band() {
        let points = vec![point(1, 1.0, 0.5, 1.5), point(8, 2.0, 2.5, 3.0)];
        assert!(ForecastResult::new("k", "m", points, 1).is_err());
    }

    #[test]
    fn test_future_dates_are_weekly() {
        let last = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let dates = future_dates(last, 2).unwrap();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2023, 1, 8).unwrap(),
                NaiveDate::from_ymd_opt(2023, 1, 15).unwrap()
            ]
        );
    }

    #[test]
    fn test_deadline_without_budget_never_expires() {
        assert!(Deadline::start(None).check("k").is_ok());
        let expired = Deadline::start(Some(std::time::Duration::ZERO));
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(expired.check("k").is_err());
    }
}
