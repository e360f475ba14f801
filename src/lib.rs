//! # Kitchen Demand
//!
//! Umbrella crate for the kitchen demand forecasting workspace.
//!
//! - [`demand_forecast`]: order history loading, per-series forecasting,
//!   ingredient requirements, meal ranking and chart artifacts
//! - [`demand_math`]: least squares, Fourier seasonality and summary statistics
//!
//! ## Example
//!
//! ```
//! use kitchen_demand_workspace::demand_forecast::PipelineConfig;
//!
//! let config = PipelineConfig::default();
//! assert_eq!(config.location_id, 55);
//! assert_eq!(config.top_n, 5);
//! ```

pub use demand_forecast;
pub use demand_math;
