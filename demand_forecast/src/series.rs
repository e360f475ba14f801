//! Series extraction: flat order records to grouped weekly series

use crate::data::{HistoricalRecord, LocationId};
use crate::error::{ForecastError, Result};
use crate::schema;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// Ordered (date, value) history for one grouping key
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    key: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl Series {
    /// Create a series; dates must be strictly increasing
    pub fn new(key: &str, points: Vec<(NaiveDate, f64)>) -> Result<Self> {
        if let Some(pair) = points.windows(2).find(|w| w[0].0 >= w[1].0) {
            return Err(ForecastError::Input(format!(
                "Series '{}' dates must be strictly increasing ({} then {})",
                key, pair[0].0, pair[1].0
            )));
        }

        let (dates, values) = points.into_iter().unzip();
        Ok(Self {
            key: key.to_string(),
            dates,
            values,
        })
    }

    /// Same points under a different key
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all values
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Number of finite observations
    pub fn observation_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }

    /// Every value is zero
    pub fn is_degenerate(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// Attribute a series is grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Category,
    Meal,
    /// Every row of the location in one series keyed `all`
    All,
}

impl GroupBy {
    fn key_of<'a>(&self, record: &'a HistoricalRecord) -> &'a str {
        match self {
            GroupBy::Category => &record.category,
            GroupBy::Meal => &record.meal_id,
            GroupBy::All => schema::ALL,
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Category => write!(f, "{}", schema::CATEGORY),
            GroupBy::Meal => write!(f, "{}", schema::MEAL_ID),
            GroupBy::All => write!(f, "{}", schema::ALL),
        }
    }
}

/// Attribute that is summed into the series values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueColumn {
    Orders,
    /// Index into the ingredient vocabulary, with its name
    Ingredient { index: usize, name: String },
}

impl ValueColumn {
    /// Resolve a column name against the ingredient vocabulary
    pub fn resolve(name: &str, vocabulary: &[String]) -> Result<Self> {
        if name == schema::NUM_ORDERS {
            return Ok(ValueColumn::Orders);
        }

        vocabulary
            .iter()
            .position(|v| v == name)
            .map(|index| ValueColumn::Ingredient {
                index,
                name: name.to_string(),
            })
            .ok_or_else(|| ForecastError::Input(format!("Unknown value column '{}'", name)))
    }

    pub fn name(&self) -> &str {
        match self {
            ValueColumn::Orders => schema::NUM_ORDERS,
            ValueColumn::Ingredient { name, .. } => name,
        }
    }

    fn value_of(&self, record: &HistoricalRecord) -> Result<f64> {
        match self {
            ValueColumn::Orders => Ok(record.num_orders as f64),
            ValueColumn::Ingredient { index, name } => {
                record.ingredients.get(*index).copied().ok_or_else(|| {
                    ForecastError::Input(format!(
                        "Record for meal '{}' has no value for ingredient '{}'",
                        record.meal_id, name
                    ))
                })
            }
        }
    }
}

/// Build one series per grouping key.
///
/// Rows are restricted to `location` when given, then summed per
/// (key, date). Series come back ordered by key. No matching rows yields an
/// empty vector.
pub fn extract(
    records: &[HistoricalRecord],
    group_by: GroupBy,
    value: &ValueColumn,
    location: Option<LocationId>,
) -> Result<Vec<Series>> {
    let mut groups: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();

    for record in records
        .iter()
        .filter(|r| location.map_or(true, |id| r.location_id == id))
    {
        let amount = value.value_of(record)?;
        *groups
            .entry(group_by.key_of(record))
            .or_default()
            .entry(record.date)
            .or_insert(0.0) += amount;
    }

    groups
        .into_iter()
        .map(|(key, by_date)| Series::new(key, by_date.into_iter().collect()))
        .collect()
}

/// Build the `all` series for several value columns at once, keyed by the
/// value column name (used for ingredient usage).
pub fn extract_totals(
    records: &[HistoricalRecord],
    values: &[ValueColumn],
    location: Option<LocationId>,
) -> Result<Vec<Series>> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        // One key at most, since everything groups under `all`
        if let Some(series) = extract(records, GroupBy::All, value, location)?
            .into_iter()
            .next()
        {
            out.push(series.with_key(value.name()));
        }
    }
    Ok(out)
}
