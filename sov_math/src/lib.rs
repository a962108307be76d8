//! # SOV Math
//!
//! Numeric building blocks shared by the forecasting and launch impact crates.
//! This crate provides descriptive statistics, least squares solvers, a
//! stationarity test, classical seasonal decomposition and the two-sample
//! tests used to judge whether a launch effect is real.

use thiserror::Error;

pub mod decomposition;
pub mod moving_averages;
pub mod regression;
pub mod stationarity;
pub mod stats;

/// Errors that can occur in statistical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Singular system: {0}")]
    SingularMatrix(String),
}

/// Result type for statistical operations
pub type Result<T> = std::result::Result<T, MathError>;
