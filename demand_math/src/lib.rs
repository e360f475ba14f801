//! # Demand Math
//!
//! Numerical building blocks for the demand forecasting crates.
//! This crate provides the regression solver, the Fourier seasonality
//! features and the descriptive statistics the forecasting models are
//! assembled from.

use thiserror::Error;

pub mod regression;
pub mod seasonality;
pub mod stats;

pub use regression::{LeastSquares, NormalEquations};
pub use seasonality::FourierSeasonality;

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for demand math operations
pub type Result<T> = std::result::Result<T, MathError>;
