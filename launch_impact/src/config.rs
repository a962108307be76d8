//! Launch analysis configuration threaded through every component call

use crate::control::ControlSelection;
use crate::error::{ImpactError, Result};
use serde::{Deserialize, Serialize};

/// Pre/post window sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Periods on each side of the launch
    pub length: usize,
    /// Pre-launch periods required for a baseline
    pub min_pre_periods: usize,
    /// Post-launch periods required
    pub min_post_periods: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            length: 6,
            min_pre_periods: 1,
            min_post_periods: 1,
        }
    }
}

impl WindowConfig {
    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return Err(ImpactError::InvalidParameter(
                "Window length must be positive".to_string(),
            ));
        }
        if self.min_pre_periods == 0 || self.min_post_periods == 0 {
            return Err(ImpactError::InvalidParameter(
                "Minimum pre/post periods must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// SOV decomposition settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposerConfig {
    /// Allowed mismatch between the components and the total, as a share of the total
    pub reconciliation_tolerance: f64,
}

impl Default for DecomposerConfig {
    fn default() -> Self {
        Self {
            reconciliation_tolerance: 0.01,
        }
    }
}

impl DecomposerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.reconciliation_tolerance >= 0.0 && self.reconciliation_tolerance < 1.0) {
            return Err(ImpactError::InvalidParameter(
                "Reconciliation tolerance must be in [0, 1)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Significance test settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignificanceConfig {
    pub alpha: f64,
    /// Post periods from which Welch's t-test replaces the bootstrap
    pub bootstrap_threshold: usize,
    pub bootstrap_resamples: usize,
    /// Seed for bootstrap resampling
    pub seed: u64,
}

impl Default for SignificanceConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            bootstrap_threshold: 8,
            bootstrap_resamples: 2000,
            seed: 42,
        }
    }
}

impl SignificanceConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ImpactError::InvalidParameter(
                "Alpha must be between 0 and 1".to_string(),
            ));
        }
        if self.bootstrap_resamples == 0 {
            return Err(ImpactError::InvalidParameter(
                "At least one bootstrap resample is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Net impact classification thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Threshold as a share of the total launch volume
    pub tau_fraction: f64,
    /// Absolute threshold in volume units, overrides `tau_fraction`
    pub absolute_tau: Option<f64>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            tau_fraction: 0.05,
            absolute_tau: None,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.tau_fraction >= 0.0) {
            return Err(ImpactError::InvalidParameter(
                "Threshold fraction must be non-negative".to_string(),
            ));
        }
        if let Some(tau) = self.absolute_tau {
            if !(tau >= 0.0) {
                return Err(ImpactError::InvalidParameter(
                    "Absolute threshold must be non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Launch identification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentificationConfig {
    /// Periods before the latest period in which launches are considered
    pub lookback: usize,
    /// Launches kept after ranking
    pub top_n: usize,
    /// Periods compared for early growth
    pub early_periods: usize,
}

impl Default for IdentificationConfig {
    fn default() -> Self {
        Self {
            lookback: 12,
            top_n: 5,
            early_periods: 3,
        }
    }
}

impl IdentificationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 || self.early_periods == 0 {
            return Err(ImpactError::InvalidParameter(
                "Top-N and early growth periods must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Every launch analysis option
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    pub window: WindowConfig,
    pub control: ControlSelection,
    pub decomposer: DecomposerConfig,
    pub significance: SignificanceConfig,
    pub classifier: ClassifierConfig,
    pub identification: IdentificationConfig,
}

impl ImpactConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        self.decomposer.validate()?;
        self.significance.validate()?;
        self.classifier.validate()?;
        self.identification.validate()
    }
}
