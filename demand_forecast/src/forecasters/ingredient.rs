//! Ingredient consumption forecasts

use super::{BatchForecaster, BatchOutcome};
use crate::data::{HistoricalRecord, LocationId};
use crate::error::Result;
use crate::series::{self, Series, ValueColumn};
use tracing::{debug, info};

const GROUP: &str = "ingredient";

/// Result of the ingredient forecaster
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientForecast {
    pub outcome: BatchOutcome,
    /// Ingredients with no recorded usage, in vocabulary order
    pub skipped: Vec<String>,
}

/// Forecasts total weekly usage of every vocabulary ingredient
#[derive(Debug, Clone)]
pub struct IngredientForecaster {
    batch: BatchForecaster,
}

impl IngredientForecaster {
    pub fn new(batch: BatchForecaster) -> Self {
        Self { batch }
    }

    /// Forecast each ingredient of `vocabulary`, skipping any whose history
    /// sums to exactly zero
    pub fn forecast(
        &self,
        records: &[HistoricalRecord],
        vocabulary: &[String],
        location: Option<LocationId>,
    ) -> Result<IngredientForecast> {
        let columns = vocabulary
            .iter()
            .map(|name| ValueColumn::resolve(name, vocabulary))
            .collect::<Result<Vec<_>>>()?;

        let (used, unused): (Vec<Series>, Vec<Series>) =
            series::extract_totals(records, &columns, location)?
                .into_iter()
                .partition(|s| s.total() != 0.0);

        let skipped: Vec<String> = unused.iter().map(|s| s.key().to_string()).collect();
        if !skipped.is_empty() {
            debug!(skipped = ?skipped, "Ingredients without usage");
        }

        let outcome = self.batch.forecast_all(GROUP, &used);
        info!(
            ingredients = vocabulary.len(),
            skipped = skipped.len(),
            forecast = outcome.forecasts.len(),
            failed = outcome.failures.len(),
            "Ingredient consumption forecast"
        );

        Ok(IngredientForecast { outcome, skipped })
    }
}
