//! Fourier-series seasonality features
//!
//! A seasonal cycle of period `P` days is represented by `order` sine/cosine
//! pairs evaluated at the day offset of each observation.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Days in a week
pub const WEEKLY_PERIOD_DAYS: f64 = 7.0;
/// Mean days in a year
pub const YEARLY_PERIOD_DAYS: f64 = 365.25;
/// One day
pub const DAILY_PERIOD_DAYS: f64 = 1.0;

/// One seasonal component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FourierSeasonality {
    name: String,
    period_days: f64,
    order: usize,
}

impl FourierSeasonality {
    /// Create a seasonal component with the given period and number of harmonics
    pub fn new(name: &str, period_days: f64, order: usize) -> Result<Self> {
        if !(period_days > 0.0) || !period_days.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Seasonal period must be positive, got {}",
                period_days
            )));
        }
        if order == 0 {
            return Err(MathError::InvalidInput(
                "Fourier order must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            period_days,
            order,
        })
    }

    /// Weekly cycle with three harmonics
    pub fn weekly() -> Self {
        Self {
            name: "weekly".to_string(),
            period_days: WEEKLY_PERIOD_DAYS,
            order: 3,
        }
    }

    /// Yearly cycle with ten harmonics
    pub fn yearly() -> Self {
        Self {
            name: "yearly".to_string(),
            period_days: YEARLY_PERIOD_DAYS,
            order: 10,
        }
    }

    /// Daily cycle with four harmonics
    pub fn daily() -> Self {
        Self {
            name: "daily".to_string(),
            period_days: DAILY_PERIOD_DAYS,
            order: 4,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period_days(&self) -> f64 {
        self.period_days
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of feature columns this component contributes
    pub fn width(&self) -> usize {
        2 * self.order
    }

    /// Append the sine/cosine features for day offset `t_days` to `row`
    pub fn extend_row(&self, t_days: f64, row: &mut Vec<f64>) {
        for k in 1..=self.order {
            let angle = 2.0 * PI * k as f64 * t_days / self.period_days;
            row.push(angle.sin());
            row.push(angle.cos());
        }
    }

    /// Features for a single day offset
    pub fn features(&self, t_days: f64) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.width());
        self.extend_row(t_days, &mut row);
        row
    }
}
