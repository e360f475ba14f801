//! Historical order table handling

use crate::error::{ForecastError, Result};
use crate::schema;
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Identifier of a restaurant location (`center_id` in the source table)
pub type LocationId = i64;

/// Map a week offset to its calendar date: `epoch + week * 7 days`
pub fn week_to_date(epoch: NaiveDate, week: i64) -> Result<NaiveDate> {
    Duration::try_weeks(week)
        .and_then(|offset| epoch.checked_add_signed(offset))
        .ok_or_else(|| ForecastError::Input(format!("Week offset {} is out of range", week)))
}

/// One row of the order history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRecord {
    /// Week offset from the epoch
    pub week: i64,
    /// Calendar date derived from `week`
    pub date: NaiveDate,
    pub location_id: LocationId,
    pub category: String,
    pub meal_id: String,
    pub cuisine: String,
    pub num_orders: u64,
    /// Ingredient quantities, aligned with the table vocabulary
    pub ingredients: Vec<f64>,
}

/// Validated historical order table
#[derive(Debug, Clone)]
pub struct HistoricalTable {
    /// Data frame with normalised column types
    df: DataFrame,
    /// Name of the location column actually present
    location_column: String,
    /// Ingredient columns, in vocabulary order
    vocabulary: Vec<String>,
    /// Date of week zero
    epoch: NaiveDate,
}

/// Data loader for historical order tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load an order table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        vocabulary: &[String],
        epoch: NaiveDate,
    ) -> Result<HistoricalTable> {
        let file = File::open(path.as_ref())?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10_000))
            .into_reader_with_file_handle(file)
            .finish()?;

        info!(
            path = %path.as_ref().display(),
            rows = df.height(),
            columns = df.width(),
            "Loaded order history"
        );

        Self::from_dataframe(df, vocabulary, epoch)
    }

    /// Create a table from an existing DataFrame
    pub fn from_dataframe(
        df: DataFrame,
        vocabulary: &[String],
        epoch: NaiveDate,
    ) -> Result<HistoricalTable> {
        let location_column = Self::detect_location_column(&df)?;
        Self::require_columns(&df, vocabulary)?;

        let mut casts = vec![
            col(schema::WEEK).cast(DataType::Int64),
            col(location_column.as_str()).cast(DataType::Int64),
            col(schema::NUM_ORDERS).cast(DataType::Int64),
            col(schema::CATEGORY).cast(DataType::String),
            col(schema::MEAL_ID).cast(DataType::String),
            col(schema::CUISINE).cast(DataType::String),
        ];
        casts.extend(
            vocabulary
                .iter()
                .map(|name| col(name.as_str()).cast(DataType::Float64)),
        );

        let empty_cells = vocabulary
            .iter()
            .map(|name| Ok(df.column(name)?.null_count()))
            .collect::<Result<Vec<usize>>>()?;

        let df = df.lazy().with_columns(casts).collect()?;

        // A cast only adds nulls where a cell held text
        for (name, empty) in vocabulary.iter().zip(&empty_cells) {
            let unparsed = df.column(name)?.null_count().saturating_sub(*empty);
            if unparsed > 0 {
                return Err(ForecastError::Input(format!(
                    "Ingredient column '{}' has {} non-numeric value(s)",
                    name, unparsed
                )));
            }
        }

        // Empty quantity cells count as zero
        let df = df
            .lazy()
            .with_columns(
                vocabulary
                    .iter()
                    .map(|name| col(name.as_str()).fill_null(lit(0.0)))
                    .collect::<Vec<_>>(),
            )
            .collect()?;

        let table = HistoricalTable {
            df,
            location_column,
            vocabulary: vocabulary.to_vec(),
            epoch,
        };
        table.validate()?;

        debug!(
            rows = table.len(),
            ingredients = table.vocabulary.len(),
            "Order history validated"
        );
        Ok(table)
    }

    /// Detect the location column, accepting `location_id` as an alias
    fn detect_location_column(df: &DataFrame) -> Result<String> {
        let columns = df.schema();
        for candidate in [schema::LOCATION_ID, schema::LOCATION_ID_ALIAS] {
            if columns.contains(candidate) {
                return Ok(candidate.to_string());
            }
        }

        Err(ForecastError::Input(format!(
            "Missing location column: expected '{}' or '{}'",
            schema::LOCATION_ID,
            schema::LOCATION_ID_ALIAS
        )))
    }

    /// Every required and vocabulary column must be present
    fn require_columns(df: &DataFrame, vocabulary: &[String]) -> Result<()> {
        let columns = df.schema();
        let missing: Vec<&str> = schema::REQUIRED
            .iter()
            .copied()
            .chain(vocabulary.iter().map(String::as_str))
            .filter(|name| !columns.contains(name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ForecastError::Input(format!(
                "Missing required column(s): {}",
                missing.join(", ")
            )))
        }
    }
}

impl HistoricalTable {
    /// Check nulls and signs after type normalisation
    fn validate(&self) -> Result<()> {
        let key_columns = [
            schema::WEEK,
            self.location_column.as_str(),
            schema::NUM_ORDERS,
            schema::CATEGORY,
            schema::MEAL_ID,
            schema::CUISINE,
        ];
        for name in key_columns {
            let nulls = self.df.column(name)?.null_count();
            if nulls > 0 {
                return Err(ForecastError::Input(format!(
                    "Column '{}' has {} missing or non-numeric value(s)",
                    name, nulls
                )));
            }
        }

        let orders = self.column_i64(schema::NUM_ORDERS)?;
        if let Some(bad) = orders.iter().find(|v| **v < 0) {
            return Err(ForecastError::Input(format!(
                "Column '{}' contains a negative value ({})",
                schema::NUM_ORDERS,
                bad
            )));
        }

        for name in &self.vocabulary {
            let values = self.column_f64(name)?;
            if let Some(bad) = values.iter().find(|v| **v < 0.0 || !v.is_finite()) {
                return Err(ForecastError::Input(format!(
                    "Ingredient column '{}' contains an invalid quantity ({})",
                    name, bad
                )));
            }
        }

        Ok(())
    }

    /// Restrict the table to one location
    pub fn filter_location(&self, location_id: LocationId) -> Result<Self> {
        let df = self
            .df
            .clone()
            .lazy()
            .filter(col(self.location_column.as_str()).eq(lit(location_id)))
            .collect()?;

        debug!(
            location_id,
            before = self.len(),
            after = df.height(),
            "Filtered order history"
        );

        Ok(Self {
            df,
            location_column: self.location_column.clone(),
            vocabulary: self.vocabulary.clone(),
            epoch: self.epoch,
        })
    }

    /// Distinct location ids present in the table
    pub fn locations(&self) -> Result<Vec<LocationId>> {
        let ids: BTreeSet<LocationId> = self
            .column_i64(&self.location_column)?
            .into_iter()
            .collect();
        Ok(ids.into_iter().collect())
    }

    /// Materialise the rows with their derived dates
    pub fn records(&self) -> Result<Vec<HistoricalRecord>> {
        let weeks = self.column_i64(schema::WEEK)?;
        let locations = self.column_i64(&self.location_column)?;
        let orders = self.column_i64(schema::NUM_ORDERS)?;
        let categories = self.column_str(schema::CATEGORY)?;
        let meals = self.column_str(schema::MEAL_ID)?;
        let cuisines = self.column_str(schema::CUISINE)?;
        let ingredient_columns = self
            .vocabulary
            .iter()
            .map(|name| self.column_f64(name))
            .collect::<Result<Vec<_>>>()?;

        let mut records = Vec::with_capacity(self.len());
        for i in 0..self.len() {
            records.push(HistoricalRecord {
                week: weeks[i],
                date: week_to_date(self.epoch, weeks[i])?,
                location_id: locations[i],
                category: categories[i].clone(),
                meal_id: meals[i].clone(),
                cuisine: cuisines[i].clone(),
                num_orders: orders[i] as u64,
                ingredients: ingredient_columns.iter().map(|c| c[i]).collect(),
            });
        }

        Ok(records)
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Ingredient vocabulary, in column order
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Date of week zero
    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Helper method to get a column as i64 values
    fn column_i64(&self, name: &str) -> Result<Vec<i64>> {
        let series = self.df.column(name)?.as_materialized_series();
        Ok(series.i64()?.into_iter().flatten().collect())
    }

    /// Helper method to get a column as f64 values
    fn column_f64(&self, name: &str) -> Result<Vec<f64>> {
        let series = self.df.column(name)?.as_materialized_series();
        Ok(series
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect())
    }

    /// Helper method to get a column as owned strings
    fn column_str(&self, name: &str) -> Result<Vec<String>> {
        let series = self.df.column(name)?.as_materialized_series();
        Ok(series
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect())
    }
}
