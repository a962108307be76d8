//! # Launch Lens
//!
//! Portfolio analytics for product launches, built on two workspace crates:
//!
//! - [`demand_forecast`]: ensemble demand forecasting per series
//! - [`launch_impact`]: source-of-volume decomposition and impact
//!   classification per launch
//!
//! This crate adds TOML configuration, tracing setup and a rayon pipeline
//! that runs either over many series or many launches.
//!
//! ## Example
//!
//! ```rust,no_run
//! use demand_forecast::{Granularity, Period, SeriesStore};
//! use launch_impact::ProductCatalog;
//! use launch_lens::{telemetry, AnalysisConfig, Pipeline};
//!
//! # fn main() -> Result<(), launch_lens::LensError> {
//! telemetry::init();
//! let config = AnalysisConfig::load_from_file("launch_lens.toml")?;
//! let store = SeriesStore::from_csv("sales.csv", Granularity::Monthly)?;
//! let catalog = ProductCatalog::from_csv("products.csv", Granularity::Monthly)?;
//!
//! let pipeline = Pipeline::new(config)?;
//! let summary = pipeline.summarize(&store, &catalog, Period(2024 * 12 + 11))?;
//! for rollup in &summary.by_category {
//!     println!("{}: net {:.0} ({:.1}%)", rollup.key, rollup.net_impact, rollup.net_impact_pct);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;

pub use crate::config::AnalysisConfig;
pub use crate::error::{LensError, Result};
pub use crate::pipeline::{LaunchFailure, Pipeline, PortfolioSummary};

pub use demand_forecast;
pub use launch_impact;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
