//! Ingredient ratios per category and next-period requirement aggregation

use crate::data::{HistoricalRecord, LocationId};
use crate::error::{ForecastError, Result};
use crate::models::ForecastResult;
use std::collections::BTreeMap;
use tracing::debug;

/// Quantity per ingredient over the whole vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementVector {
    names: Vec<String>,
    quantities: Vec<f64>,
}

impl RequirementVector {
    /// All-zero vector over `vocabulary`
    pub fn zeros(vocabulary: &[String]) -> Self {
        Self {
            names: vocabulary.to_vec(),
            quantities: vec![0.0; vocabulary.len()],
        }
    }

    /// Quantity of one ingredient, `None` outside the vocabulary
    pub fn get(&self, ingredient: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == ingredient)
            .map(|i| self.quantities[i])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn quantities(&self) -> &[f64] {
        &self.quantities
    }

    /// Every quantity is zero
    pub fn is_zero(&self) -> bool {
        self.quantities.iter().all(|q| *q == 0.0)
    }

    /// `self += factor * other`; both vectors must share a vocabulary
    pub fn add_scaled(&mut self, other: &RequirementVector, factor: f64) -> Result<()> {
        if self.names != other.names {
            return Err(ForecastError::InvalidParameter(
                "Requirement vectors are over different vocabularies".to_string(),
            ));
        }
        for (q, o) in self.quantities.iter_mut().zip(&other.quantities) {
            *q += factor * o;
        }
        Ok(())
    }

    /// Strictly positive entries, largest first (ties by name)
    pub fn surfaced(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .names
            .iter()
            .zip(&self.quantities)
            .filter(|(_, q)| **q > 0.0)
            .map(|(n, q)| (n.clone(), *q))
            .collect();
        entries.sort_by(|(na, a), (nb, b)| b.total_cmp(a).then_with(|| na.cmp(nb)));
        entries
    }
}

/// Average ingredient use per order for each category.
///
/// For a category the ratio of ingredient `i` is
/// `Σ(ingredient_i × num_orders) / Σ num_orders` over its rows. A category
/// with no orders gets the zero vector.
pub fn ingredient_ratios(
    records: &[HistoricalRecord],
    vocabulary: &[String],
    location: Option<LocationId>,
) -> BTreeMap<String, RequirementVector> {
    let mut usage: BTreeMap<&str, (Vec<f64>, f64)> = BTreeMap::new();

    for record in records
        .iter()
        .filter(|r| location.map_or(true, |id| r.location_id == id))
    {
        let (totals, orders) = usage
            .entry(record.category.as_str())
            .or_insert_with(|| (vec![0.0; vocabulary.len()], 0.0));
        let weight = record.num_orders as f64;
        for (total, amount) in totals.iter_mut().zip(&record.ingredients) {
            *total += amount * weight;
        }
        *orders += weight;
    }

    usage
        .into_iter()
        .map(|(category, (totals, orders))| {
            let mut ratio = RequirementVector::zeros(vocabulary);
            if orders > 0.0 {
                for (q, total) in ratio.quantities.iter_mut().zip(totals) {
                    *q = total / orders;
                }
            }
            (category.to_string(), ratio)
        })
        .collect()
}

/// Next-period requirement: Σ over categories with both a forecast and a
/// ratio vector of `max(next estimate, 0) × ratio`.
///
/// Categories without a forecast contribute nothing.
pub fn aggregate_requirements(
    forecasts: &BTreeMap<String, ForecastResult>,
    ratios: &BTreeMap<String, RequirementVector>,
    vocabulary: &[String],
) -> Result<RequirementVector> {
    let mut total = RequirementVector::zeros(vocabulary);

    for (category, forecast) in forecasts {
        let Some(ratio) = ratios.get(category) else {
            continue;
        };
        // A negative order forecast would imply negative ingredient use
        let orders = forecast.next_period().estimate.max(0.0);
        debug!(category = %category, orders, "Adding category requirement");
        total.add_scaled(ratio, orders)?;
    }

    Ok(total)
}
