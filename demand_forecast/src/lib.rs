//! # Demand Forecast
//!
//! Ensemble demand forecasting for product portfolio time series.
//!
//! ## Features
//!
//! - Series store with gap-free, per-period volume and value observations
//! - Long-format CSV loading (`series_id,period,volume,value`)
//! - Seasonal ARIMA with automatic differencing and AIC order selection
//! - Piecewise-linear trend model with changepoints and Fourier seasonality
//! - Inverse-error ensemble weighting with pooled forecast intervals
//! - Graceful degradation: trend-only mode for short histories and a
//!   seasonal-average fallback when every model fails
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use demand_forecast::{ForecastConfig, ForecastEngine, Granularity, SeriesStore};
//!
//! # fn main() -> Result<(), demand_forecast::ForecastError> {
//! let store = SeriesStore::from_csv("sales.csv", Granularity::Monthly)?;
//! let engine = ForecastEngine::new(ForecastConfig::for_granularity(Granularity::Monthly))?;
//!
//! let result = engine.forecast(store.get("SKU-001")?)?;
//! for point in &result.points {
//!     println!("{} {:.1} [{:.1}, {:.1}]", point.period, point.point, point.lower, point.upper);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod metrics;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use crate::config::ForecastConfig;
pub use crate::data::{Granularity, Observation, Period, PeriodRange, Series, SeriesStore};
pub use crate::engine::{
    Confidence, DecompositionSummary, ForecastEngine, ForecastMode, ForecastPoint,
    ForecastResult, ForecastWarning, ModelReport,
};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::ErrorMetrics;
pub use crate::models::{FittedModel, ForecastModel, ModelForecast, ModelKind};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
