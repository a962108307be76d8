//! # Launch Impact
//!
//! Source-of-volume analysis for product launches: how much of a launch's
//! volume was taken from its own portfolio, how much from competitors and
//! how much is new demand.
//!
//! ## Features
//!
//! - Pre/post window selection clipped to available history
//! - Control group policies, built in or caller-supplied
//! - Difference-in-differences decomposition into cannibalization,
//!   competitor share and market expansion, reconciled to the launch volume
//! - Welch t-test or seeded bootstrap significance of the portfolio effect
//! - Additive / substitutive / neutral classification with optional ROI
//! - Recent launch ranking and category or brand roll-ups
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use demand_forecast::{Granularity, SeriesStore};
//! use launch_impact::{ImpactConfig, LaunchAnalyzer, LaunchEvent, ProductCatalog};
//!
//! # fn main() -> Result<(), launch_impact::ImpactError> {
//! let store = SeriesStore::from_csv("sales.csv", Granularity::Monthly)?;
//! let catalog = ProductCatalog::from_csv("products.csv", Granularity::Monthly)?;
//! let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default())?;
//!
//! let event = LaunchEvent::from_catalog(&catalog, "SKU-NEW")?;
//! let report = analyzer.analyze(&event)?;
//! println!(
//!     "{}: {:.0} cannibalized, {}",
//!     report.event.target,
//!     report.breakdown.cannibalization_volume,
//!     report.classification.category
//! );
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod analyzer;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod control;
pub mod decomposer;
pub mod error;
pub mod identify;
pub mod significance;
pub mod window;

pub use crate::aggregate::{rollup_by_brand, rollup_by_category, Rollup};
pub use crate::analyzer::{LaunchAnalyzer, LaunchReport};
pub use crate::catalog::{LaunchEvent, ProductCatalog, ProductInfo};
pub use crate::classifier::{classify, ImpactCategory, ImpactClassification};
pub use crate::config::{
    ClassifierConfig, DecomposerConfig, IdentificationConfig, ImpactConfig, SignificanceConfig,
    WindowConfig,
};
pub use crate::control::{ControlPolicy, ControlSelection};
pub use crate::decomposer::{
    DidPanel, ReconciliationWarning, SiblingImpact, SovBreakdown, SovDecomposer, SovShares,
};
pub use crate::error::{ImpactError, Result};
pub use crate::identify::{identify_launches, IdentifiedLaunch, LaunchPerformance};
pub use crate::significance::{
    test_significance, SignificanceOutcome, SignificanceResult, TestMethod,
};
pub use crate::window::{select_windows, LaunchWindows};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
