//! Order demand per menu category

use super::{BatchForecaster, BatchOutcome};
use crate::data::{HistoricalRecord, LocationId};
use crate::error::Result;
use crate::schema;
use crate::series::{self, GroupBy, ValueColumn};
use tracing::info;

/// Forecasts weekly order counts for every category of a location
#[derive(Debug, Clone)]
pub struct CategoryForecaster {
    batch: BatchForecaster,
}

impl CategoryForecaster {
    pub fn new(batch: BatchForecaster) -> Self {
        Self { batch }
    }

    /// Forecast every category present in `records`.
    ///
    /// All-zero categories are still forecast.
    pub fn forecast(
        &self,
        records: &[HistoricalRecord],
        location: Option<LocationId>,
    ) -> Result<BatchOutcome> {
        let series = series::extract(records, GroupBy::Category, &ValueColumn::Orders, location)?;
        let outcome = self.batch.forecast_all(schema::CATEGORY, &series);

        info!(
            categories = series.len(),
            forecast = outcome.forecasts.len(),
            failed = outcome.failures.len(),
            "Category demand forecast"
        );
        Ok(outcome)
    }
}
