//! Batch forecasters over many independent series
//!
//! Each forecaster extracts its series, fans the fits out with rayon and
//! collects `(key, result-or-error)` pairs back into a key-ordered map. A
//! failed series is recorded and left out of the map; it never aborts the
//! batch.

use crate::error::ForecastError;
use crate::models::{ForecastModel, ForecastResult, ModelConfig};
use crate::series::Series;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod category;
pub mod ingredient;
pub mod meal;

pub use category::CategoryForecaster;
pub use ingredient::{IngredientForecast, IngredientForecaster};
pub use meal::{rank_meals, MealForecaster, RankedMeal};

/// A series that could not be forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesFailure {
    /// What the series was grouped by (category, ingredient, meal_id)
    pub group: String,
    pub key: String,
    pub reason: String,
    /// Too little history, as opposed to a failed fit
    pub insufficient_history: bool,
}

/// Forecasts that succeeded and the series that did not
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub forecasts: BTreeMap<String, ForecastResult>,
    pub failures: Vec<SeriesFailure>,
}

impl BatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.forecasts.is_empty()
    }
}

/// Fits one model to every series of a batch
#[derive(Debug, Clone)]
pub struct BatchForecaster {
    model: Arc<dyn ForecastModel>,
    config: ModelConfig,
}

impl BatchForecaster {
    pub fn new(model: Arc<dyn ForecastModel>, config: ModelConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &dyn ForecastModel {
        self.model.as_ref()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Forecast every series, tolerating per-series failures
    pub fn forecast_all(&self, group: &str, series: &[Series]) -> BatchOutcome {
        let results: Vec<(&str, Result<ForecastResult, ForecastError>)> = series
            .par_iter()
            .map(|s| (s.key(), self.model.fit(s, &self.config)))
            .collect();

        let mut outcome = BatchOutcome::default();
        for (key, result) in results {
            match result {
                Ok(forecast) => {
                    if let Some(metrics) = forecast.metrics() {
                        debug!(group, key, %metrics, "Series forecast");
                    }
                    outcome.forecasts.insert(key.to_string(), forecast);
                }
                Err(err) => {
                    warn!(group, key, error = %err, "Skipping series");
                    outcome.failures.push(SeriesFailure {
                        group: group.to_string(),
                        key: key.to_string(),
                        insufficient_history: matches!(
                            err,
                            ForecastError::InsufficientHistory { .. }
                        ),
                        reason: err.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdditiveModel;
    use chrono::{Duration, NaiveDate};

    fn series(key: &str, values: &[f64]) -> Series {
        let start = NaiveDate::from_ymd_opt(2023, 1, 8).unwrap();
        Series::new(
            key,
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::weeks(i as i64), *v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_failed_series_do_not_abort_batch() {
        let batch = vec![
            series("a", &[1.0, 2.0, 3.0]),
            series("b", &[4.0]),
            series("c", &[0.0, 0.0, 0.0]),
        ];
        let forecaster = BatchForecaster::new(Arc::new(AdditiveModel::new()), ModelConfig::default());

        let outcome = forecaster.forecast_all("category", &batch);
        assert_eq!(outcome.forecasts.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].key, "b");
        assert!(outcome.failures[0].insufficient_history);
    }
}
