//! End-to-end analysis of one launch

use crate::catalog::{LaunchEvent, ProductCatalog};
use crate::classifier::{classify, ImpactClassification};
use crate::config::ImpactConfig;
use crate::control::ControlPolicy;
use crate::decomposer::{SovBreakdown, SovDecomposer};
use crate::error::Result;
use crate::significance::{test_significance, SignificanceResult};
use crate::window::{select_windows, LaunchWindows};
use demand_forecast::SeriesStore;
use serde::Serialize;
use tracing::info;

/// Everything computed for one launch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchReport {
    pub event: LaunchEvent,
    pub windows: LaunchWindows,
    pub breakdown: SovBreakdown,
    pub significance: SignificanceResult,
    pub classification: ImpactClassification,
}

impl LaunchReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs window selection, decomposition, testing and classification
/// against a fixed store and catalog
#[derive(Debug, Clone)]
pub struct LaunchAnalyzer<'a> {
    store: &'a SeriesStore,
    catalog: &'a ProductCatalog,
    policy: ControlPolicy,
    config: ImpactConfig,
}

impl<'a> LaunchAnalyzer<'a> {
    /// Create an analyzer using the control policy named in `config`
    pub fn new(
        store: &'a SeriesStore,
        catalog: &'a ProductCatalog,
        config: ImpactConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            catalog,
            policy: config.control.clone().into(),
            config,
        })
    }

    /// Replace the control policy, e.g. with a custom predicate
    pub fn with_policy(mut self, policy: ControlPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &ImpactConfig {
        &self.config
    }

    pub fn policy(&self) -> &ControlPolicy {
        &self.policy
    }

    /// Analyse a single launch
    pub fn analyze(&self, event: &LaunchEvent) -> Result<LaunchReport> {
        event.validate()?;
        let windows = select_windows(event, self.store, &self.config.window)?;

        let decomposer = SovDecomposer::new(
            self.store,
            self.catalog,
            &self.policy,
            &self.config.decomposer,
        );
        let breakdown = decomposer.decompose(event, &windows)?;
        let significance = test_significance(&breakdown.panel, &self.config.significance)?;
        let classification = classify(event, &breakdown, &significance, &self.config.classifier)?;

        info!(
            launch = %event.target,
            periods = windows.len(),
            total = breakdown.total_launch_volume,
            net = classification.net_portfolio_delta,
            category = %classification.category,
            p_value = ?significance.p_value(),
            "launch analysed"
        );

        Ok(LaunchReport {
            event: event.clone(),
            windows,
            breakdown,
            significance,
            classification,
        })
    }
}
