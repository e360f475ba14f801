//! Meal popularity: per-meal forecasts ranked by next-week demand

use super::{BatchForecaster, BatchOutcome};
use crate::data::{HistoricalRecord, LocationId};
use crate::error::Result;
use crate::models::ForecastResult;
use crate::schema;
use crate::series::{self, GroupBy, ValueColumn};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::info;

/// A meal with its forecast demand and catalogue details
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMeal {
    pub meal_id: String,
    pub category: String,
    pub cuisine: String,
    /// Next-period point estimate of orders
    pub forecast_value: f64,
}

/// Forecasts weekly orders per meal and ranks the meals
#[derive(Debug, Clone)]
pub struct MealForecaster {
    batch: BatchForecaster,
}

impl MealForecaster {
    pub fn new(batch: BatchForecaster) -> Self {
        Self { batch }
    }

    /// Forecast every meal present in `records`
    pub fn forecast(
        &self,
        records: &[HistoricalRecord],
        location: Option<LocationId>,
    ) -> Result<BatchOutcome> {
        let series = series::extract(records, GroupBy::Meal, &ValueColumn::Orders, location)?;
        let outcome = self.batch.forecast_all(schema::MEAL_ID, &series);

        info!(
            meals = series.len(),
            forecast = outcome.forecasts.len(),
            failed = outcome.failures.len(),
            "Meal popularity forecast"
        );
        Ok(outcome)
    }
}

/// Order meal ids ascending: integer ids numerically and ahead of any
/// other ids, which compare as text
fn compare_meal_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Rank meals by next-period estimate, highest first, and keep the top `n`.
///
/// Equal estimates are ordered by ascending meal id. Category and cuisine
/// come from the first record of each meal; meals with no record are left
/// out.
pub fn rank_meals(
    forecasts: &BTreeMap<String, ForecastResult>,
    records: &[HistoricalRecord],
    n: usize,
) -> Vec<RankedMeal> {
    let mut estimates: Vec<(&str, f64)> = forecasts
        .iter()
        .map(|(meal_id, forecast)| (meal_id.as_str(), forecast.next_period().estimate))
        .collect();

    estimates.sort_by(|(id_a, a), (id_b, b)| {
        b.total_cmp(a).then_with(|| compare_meal_ids(id_a, id_b))
    });

    estimates
        .into_iter()
        .filter_map(|(meal_id, forecast_value)| {
            records
                .iter()
                .find(|r| r.meal_id == meal_id)
                .map(|first| RankedMeal {
                    meal_id: meal_id.to_string(),
                    category: first.category.clone(),
                    cuisine: first.cuisine.clone(),
                    forecast_value,
                })
        })
        .take(n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_compare_numerically() {
        assert_eq!(compare_meal_ids("9", "10"), Ordering::Less);
        assert_eq!(compare_meal_ids("b", "a"), Ordering::Greater);
        assert_eq!(compare_meal_ids("10", "a"), Ordering::Less);
        assert_eq!(compare_meal_ids("1a", "9"), Ordering::Greater);
    }
}
