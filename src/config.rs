//! Analysis configuration loaded from TOML

use crate::error::{LensError, Result};
use demand_forecast::ForecastConfig;
use launch_impact::ImpactConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Forecasting and launch analysis settings with the worker count.
///
/// Every section is optional in the file; missing keys take their defaults.
///
/// ```
/// use launch_lens::AnalysisConfig;
///
/// let config = AnalysisConfig::from_toml_str(
///     r#"
///     workers = 2
///
///     [forecast]
///     horizon = 6
///
///     [impact.window]
///     length = 4
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.forecast.horizon, 6);
/// assert_eq!(config.forecast.seasonal_period, 12);
/// assert_eq!(config.impact.window.length, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub forecast: ForecastConfig,
    pub impact: ImpactConfig,
    /// Size of a dedicated worker pool, the global rayon pool when absent
    pub workers: Option<usize>,
}

impl AnalysisConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.forecast.validate()?;
        self.impact.validate()?;
        if self.workers == Some(0) {
            return Err(LensError::InvalidConfig(
                "Worker count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demand_forecast::ForecastError;
    use launch_impact::{ControlSelection, ImpactError};

    #[test]
    fn test_empty_document_is_default() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_control_policy_from_toml() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            [impact.control]
            policy = "excluded_brands"
            brands = ["zeta", "omega"]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.impact.control,
            ControlSelection::ExcludedBrands {
                brands: vec!["zeta".to_string(), "omega".to_string()]
            }
        );
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let err = AnalysisConfig::from_toml_str("workers = 0").unwrap_err();
        assert!(matches!(err, LensError::InvalidConfig(_)));

        let err = AnalysisConfig::from_toml_str("[impact.significance]\nalpha = 2.0").unwrap_err();
        assert!(matches!(
            err,
            LensError::Impact(ImpactError::InvalidParameter(_))
        ));

        let err = AnalysisConfig::from_toml_str("[forecast]\nhorizon = 0").unwrap_err();
        assert!(matches!(
            err,
            LensError::Forecast(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_malformed_document() {
        let err = AnalysisConfig::from_toml_str("[forecast\nhorizon = ").unwrap_err();
        assert!(matches!(err, LensError::ConfigParse(_)));
    }
}
