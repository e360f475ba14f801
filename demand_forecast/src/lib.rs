//! # Demand Forecast
//!
//! A Rust library for forecasting kitchen demand and the ingredients it
//! requires, from a weekly order history.
//!
//! ## Features
//!
//! - Order history loading and validation (CSV via polars)
//! - Series extraction per category, meal or ingredient
//! - Pluggable single-series models (additive trend + seasonality, exponential
//!   smoothing, moving average)
//! - Category demand, ingredient consumption and meal popularity forecasts
//! - Next-week ingredient requirements from category forecasts and usage ratios
//! - SVG chart artifacts, stored under deterministic names
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::{Pipeline, PipelineConfig};
//!
//! # fn main() -> demand_forecast::error::Result<()> {
//! let config = PipelineConfig {
//!     location_id: 55,
//!     top_n: 5,
//!     ..PipelineConfig::default()
//! };
//!
//! let pipeline = Pipeline::new(config)?;
//! let report = pipeline.run_csv("orders.csv")?;
//!
//! for (ingredient, quantity) in &report.payload.ingredient_requirements {
//!     println!("{}: {:.1}", ingredient, quantity);
//! }
//! println!("{}", report.payload.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod forecasters;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod requirements;
pub mod schema;
pub mod series;

// Re-export commonly used types
pub use crate::config::{ModelKind, PipelineConfig};
pub use crate::data::{DataLoader, HistoricalRecord, HistoricalTable, LocationId};
pub use crate::error::ForecastError;
pub use crate::forecasters::{RankedMeal, SeriesFailure};
pub use crate::models::{
    AdditiveModel, EtsModel, ForecastModel, ForecastPoint, ForecastResult, ModelConfig,
    MovingAverageModel,
};
pub use crate::pipeline::{ForecastPayload, Pipeline, PipelineReport, PipelineState};
pub use crate::render::{ArtifactKind, ArtifactStore};
pub use crate::requirements::RequirementVector;
pub use crate::series::{GroupBy, Series, ValueColumn};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
