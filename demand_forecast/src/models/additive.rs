//! Additive trend plus Fourier seasonality model
//!
//! The series is modelled as
//!
//! ```text
//! y(t) = a + b·t + Σ seasonal_k(t) + ε
//! ```
//!
//! where `t` is the day offset from the first observation scaled to `[0, 1]`
//! over the history and each seasonal component is a Fourier series of its
//! period. Coefficients are estimated by ridge-penalised least squares: the
//! intercept and trend are free, seasonal terms are shrunk towards zero with
//! penalty `1 / prior_scale²`.

use super::{future_dates, require_history, Deadline, ForecastModel, ForecastPoint, ForecastResult, ModelConfig, SeasonalityOption};
use crate::error::{ForecastError, Result};
use crate::series::Series;
use chrono::NaiveDate;
use demand_math::{stats, FourierSeasonality, LeastSquares, NormalEquations};
use tracing::debug;

/// History span from which yearly seasonality switches on in `auto` mode
const AUTO_YEARLY_MIN_DAYS: i64 = 730;

/// Parameters spent on intercept and trend
const TREND_PARAMETERS: usize = 2;

/// Additive trend + seasonality forecaster
#[derive(Debug, Clone, Default)]
pub struct AdditiveModel;

impl AdditiveModel {
    pub fn new() -> Self {
        Self
    }

    /// Seasonal components enabled for a history spanning `span_days`
    fn components(config: &ModelConfig, span_days: i64) -> Vec<FourierSeasonality> {
        let mut components = Vec::new();
        if config.weekly_seasonality {
            components.push(FourierSeasonality::weekly());
        }
        let yearly = match config.yearly_seasonality {
            SeasonalityOption::On => true,
            SeasonalityOption::Off => false,
            SeasonalityOption::Auto => span_days >= AUTO_YEARLY_MIN_DAYS,
        };
        if yearly {
            components.push(FourierSeasonality::yearly());
        }
        if config.daily_seasonality {
            components.push(FourierSeasonality::daily());
        }
        components
    }
}

/// Builds design rows for one fit
struct Design {
    origin: NaiveDate,
    span_days: f64,
    components: Vec<FourierSeasonality>,
}

impl Design {
    fn width(&self) -> usize {
        TREND_PARAMETERS + self.components.iter().map(|c| c.width()).sum::<usize>()
    }

    fn row(&self, date: NaiveDate) -> Vec<f64> {
        let t_days = (date - self.origin).num_days() as f64;
        let mut row = Vec::with_capacity(self.width());
        row.push(1.0);
        row.push(t_days / self.span_days);
        for component in &self.components {
            component.extend_row(t_days, &mut row);
        }
        row
    }

    fn penalties(&self, prior_scale: f64) -> Vec<f64> {
        let seasonal = 1.0 / prior_scale.powi(2);
        let mut penalties = vec![0.0; TREND_PARAMETERS];
        penalties.resize(self.width(), seasonal);
        penalties
    }
}

impl ForecastModel for AdditiveModel {
    fn fit(&self, series: &Series, config: &ModelConfig) -> Result<ForecastResult> {
        config.validate()?;
        require_history(series)?;

        let deadline = Deadline::start(config.fit_timeout);
        let key = series.key();
        let failure = |reason: String| ForecastError::ForecastFailure {
            key: key.to_string(),
            reason,
        };

        let observations: Vec<(NaiveDate, f64)> = series
            .dates()
            .iter()
            .copied()
            .zip(series.values().iter().copied())
            .filter(|(_, v)| v.is_finite())
            .collect();

        // require_history guarantees at least two finite observations
        let origin = observations[0].0;
        let last = observations[observations.len() - 1].0;
        let span = (last - origin).num_days().max(1);

        let design = Design {
            origin,
            span_days: span as f64,
            components: Self::components(config, span),
        };

        let mut equations = NormalEquations::new(design.width())?;
        for (date, value) in &observations {
            deadline.check(key)?;
            equations.accumulate(&design.row(*date), *value)?;
        }
        deadline.check(key)?;

        let model: LeastSquares = equations
            .solve(&design.penalties(config.seasonality_prior_scale))
            .map_err(|e| failure(e.to_string()))?;

        let fitted = observations
            .iter()
            .map(|(date, _)| model.predict(&design.row(*date)))
            .collect::<std::result::Result<Vec<f64>, _>>()?;
        let observed: Vec<f64> = observations.iter().map(|(_, v)| *v).collect();
        let sigma = stats::residual_std_dev(&observed, &fitted, TREND_PARAMETERS)?;
        let z = config.z_score()?;
        let n = observations.len() as f64;

        let band = |steps_ahead: usize| z * sigma * (1.0 + steps_ahead as f64 / n).sqrt();

        let mut points: Vec<ForecastPoint> = observations
            .iter()
            .zip(&fitted)
            .map(|((date, value), estimate)| ForecastPoint {
                date: *date,
                estimate: *estimate,
                lower: estimate - band(0),
                upper: estimate + band(0),
                observed: Some(*value),
            })
            .collect();

        for (step, date) in future_dates(last, config.future_periods)?.into_iter().enumerate() {
            let estimate = model.predict(&design.row(date))?;
            if !estimate.is_finite() {
                return Err(failure(format!("non-finite estimate at {}", date)));
            }
            let width = band(step + 1);
            points.push(ForecastPoint {
                date,
                estimate,
                lower: estimate - width,
                upper: estimate + width,
                observed: None,
            });
        }

        let result = ForecastResult::new(key, self.name(), points, observations.len())?;
        debug!(
            key,
            observations = observations.len(),
            features = design.width(),
            sigma,
            next = result.next_period().estimate,
            "Fitted additive model"
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "additive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn weekly_series(key: &str, values: &[f64]) -> Series {
        let start = NaiveDate::from_ymd_opt(2023, 1, 8).unwrap();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::weeks(i as i64), *v))
            .collect();
        Series::new(key, points).unwrap()
    }

    #[test]
    fn test_linear_trend_is_extrapolated() {
        let series = weekly_series("soup", &[10.0, 12.0, 14.0, 16.0, 18.0, 20.0]);
        let result = AdditiveModel::new().fit(&series, &ModelConfig::default()).unwrap();

        let next = result.next_period();
        assert!((next.estimate - 22.0).abs() < 0.5, "estimate {}", next.estimate);
        assert_eq!(next.date, NaiveDate::from_ymd_opt(2023, 2, 19).unwrap());
        assert_eq!(result.history().len(), 6);
        assert_eq!(result.future().len(), 1);
    }

    #[test]
    fn test_band_contains_estimate() {
        let series = weekly_series("soup", &[10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 15.0]);
        let result = AdditiveModel::new().fit(&series, &ModelConfig::default()).unwrap();

        for point in result.points() {
            assert!(point.lower <= point.estimate && point.estimate <= point.upper);
        }
        let last = result.next_period();
        let first = &result.points()[0];
        assert!(last.upper - last.lower >= first.upper - first.lower);
    }

    #[test]
    fn test_single_observation_is_insufficient() {
        let series = weekly_series("lonely", &[5.0]);
        let err = AdditiveModel::new()
            .fit(&series, &ModelConfig::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientHistory { observations: 1, .. }));
    }

    #[test]
    fn test_yearly_auto_needs_two_years() {
        let config = ModelConfig::default();
        assert_eq!(AdditiveModel::components(&config, 100).len(), 1);
        assert_eq!(AdditiveModel::components(&config, 800).len(), 2);
    }
}
