//! Source-of-volume decomposition by difference-in-differences.
//!
//! The control group's pre-to-post growth stands in for what would have
//! happened without the launch. Two counterfactuals split the launch
//! volume: sibling-level for cannibalization, category-level (excluding
//! the portfolio) for share taken from competitors. Whatever remains is
//! market expansion.

use crate::catalog::{LaunchEvent, ProductCatalog};
use crate::config::DecomposerConfig;
use crate::control::ControlPolicy;
use crate::error::{ImpactError, Result};
use crate::window::LaunchWindows;
use demand_forecast::{PeriodRange, Series, SeriesStore};
use serde::Serialize;
use sov_math::stats::mean;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Cannibalization detail for one sibling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiblingImpact {
    pub id: String,
    pub pre_volume: f64,
    pub post_volume: f64,
    /// Pre volume grown at the control rate
    pub counterfactual_volume: f64,
    /// `max(0, counterfactual - post)`
    pub lost_volume: f64,
    /// Observed pre-to-post change, `None` without pre volume
    pub change_pct: Option<f64>,
}

/// Components scaled to the launch volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SovShares {
    pub cannibalization_pct: f64,
    pub competitor_pct: f64,
    pub expansion_pct: f64,
}

/// Components that failed to add up and were rescaled
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReconciliationWarning {
    /// Component sum minus total before rescaling
    pub mismatch: f64,
    pub tolerance: f64,
}

/// Per-period volumes for the significance test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DidPanel {
    /// Target plus siblings
    pub treated_pre: Vec<f64>,
    pub treated_post: Vec<f64>,
    /// Sum over the control group
    pub control_pre: Vec<f64>,
    pub control_post: Vec<f64>,
}

/// Where a launch's volume came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SovBreakdown {
    pub launch_id: String,
    pub windows: LaunchWindows,
    /// Incremental target volume, `max(0, post - pre)`
    pub total_launch_volume: f64,
    pub target_pre_volume: f64,
    pub target_post_volume: f64,
    /// Target revenue in the post window
    pub target_post_value: f64,
    pub cannibalization_volume: f64,
    pub competitor_volume: f64,
    pub expansion_volume: f64,
    /// Mean pre-to-post growth of the control group
    pub control_growth: f64,
    pub control_group: Vec<String>,
    /// Category-ex-portfolio volume expected without the launch
    pub category_counterfactual: f64,
    pub category_actual: f64,
    pub siblings: Vec<SiblingImpact>,
    /// Portfolio ids with no series in the store
    pub missing_siblings: Vec<String>,
    pub warnings: Vec<ReconciliationWarning>,
    pub panel: DidPanel,
}

impl SovBreakdown {
    /// Sum of the three components
    pub fn components_total(&self) -> f64 {
        self.cannibalization_volume + self.competitor_volume + self.expansion_volume
    }

    /// Component percentages of the launch volume, zero for an empty launch
    pub fn shares(&self) -> SovShares {
        let pct = |v: f64| {
            if self.total_launch_volume > 0.0 {
                v / self.total_launch_volume * 100.0
            } else {
                0.0
            }
        };
        SovShares {
            cannibalization_pct: pct(self.cannibalization_volume),
            competitor_pct: pct(self.competitor_volume),
            expansion_pct: pct(self.expansion_volume),
        }
    }

    /// Observed volume of target and siblings in the post window
    pub fn observed_portfolio_volume(&self) -> f64 {
        self.panel.treated_post.iter().sum()
    }

    /// Target and sibling pre volume grown at the control rate
    pub fn counterfactual_portfolio_volume(&self) -> f64 {
        self.panel.treated_pre.iter().sum::<f64>() * (1.0 + self.control_growth)
    }
}

/// Decomposes launches against one store and catalog
#[derive(Debug, Clone)]
pub struct SovDecomposer<'a> {
    store: &'a SeriesStore,
    catalog: &'a ProductCatalog,
    policy: &'a ControlPolicy,
    config: &'a DecomposerConfig,
}

impl<'a> SovDecomposer<'a> {
    pub fn new(
        store: &'a SeriesStore,
        catalog: &'a ProductCatalog,
        policy: &'a ControlPolicy,
        config: &'a DecomposerConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            policy,
            config,
        }
    }

    /// Split the launch volume of `event` over `windows`
    pub fn decompose(&self, event: &LaunchEvent, windows: &LaunchWindows) -> Result<SovBreakdown> {
        let target = self.store.get(&event.target)?;
        let target_pre_volume = target.volume_in(&windows.pre);
        let target_post_volume = target.volume_in(&windows.post);
        let total = (target_post_volume - target_pre_volume).max(0.0);

        let control_group = self.policy.select(event, self.catalog, self.store)?;
        let controls: Vec<&Series> = control_group
            .iter()
            .map(|id| self.store.get(id))
            .collect::<std::result::Result<_, _>>()?;
        let growth = control_growth(&controls, windows)?;

        let (sibling_series, missing_siblings) = self.portfolio_series(event);
        let siblings: Vec<SiblingImpact> = sibling_series
            .iter()
            .map(|series| sibling_impact(series, windows, growth))
            .collect();
        let cannibalization: f64 = siblings.iter().map(|s| s.lost_volume).sum();

        let control_ids: BTreeSet<&str> = control_group.iter().map(String::as_str).collect();
        let competitors: Vec<&Series> = self
            .catalog
            .iter()
            .filter(|p| {
                p.category == event.category
                    && p.id != event.target
                    && !event.portfolio.contains(&p.id)
                    && !control_ids.contains(p.id.as_str())
            })
            .filter_map(|p| self.store.get(&p.id).ok())
            .collect();
        let category_pre: f64 = competitors.iter().map(|s| s.volume_in(&windows.pre)).sum();
        let category_actual: f64 = competitors.iter().map(|s| s.volume_in(&windows.post)).sum();
        let category_counterfactual = category_pre * (1.0 + growth);
        let competitor = (category_counterfactual - category_actual)
            .max(0.0)
            .min((total - cannibalization).max(0.0));

        let expansion = (total - cannibalization - competitor).max(0.0);

        let mut components = [cannibalization, competitor, expansion];
        let mut warnings = Vec::new();
        let tolerance = self.config.reconciliation_tolerance * total;
        let mismatch = components.iter().sum::<f64>() - total;
        if mismatch.abs() > tolerance {
            warn!(
                launch = %event.target,
                mismatch,
                tolerance,
                "SOV components do not reconcile, rescaling"
            );
            warnings.push(ReconciliationWarning {
                mismatch,
                tolerance,
            });
            rescale(&mut components, total);
        }
        let [cannibalization_volume, competitor_volume, expansion_volume] = components;

        let panel = did_panel(target, &sibling_series, &controls, windows);

        debug!(
            launch = %event.target,
            total,
            cannibalization_volume,
            competitor_volume,
            expansion_volume,
            growth,
            "decomposed launch volume"
        );

        Ok(SovBreakdown {
            launch_id: event.target.clone(),
            windows: *windows,
            total_launch_volume: total,
            target_pre_volume,
            target_post_volume,
            target_post_value: target.value_in(&windows.post),
            cannibalization_volume,
            competitor_volume,
            expansion_volume,
            control_growth: growth,
            control_group,
            category_counterfactual,
            category_actual,
            siblings,
            missing_siblings,
            warnings,
            panel,
        })
    }

    /// Portfolio series present in the store, and the ids that are not
    fn portfolio_series(&self, event: &LaunchEvent) -> (Vec<&'a Series>, Vec<String>) {
        let mut present = Vec::new();
        let mut missing = Vec::new();
        for id in &event.portfolio {
            match self.store.get(id) {
                Ok(series) => present.push(series),
                Err(_) => missing.push(id.clone()),
            }
        }
        if !missing.is_empty() {
            warn!(
                launch = %event.target,
                missing = ?missing,
                "portfolio siblings without sales history are skipped"
            );
        }
        (present, missing)
    }
}

/// Mean pre-to-post growth over controls with positive pre volume
fn control_growth(controls: &[&Series], windows: &LaunchWindows) -> Result<f64> {
    let rates: Vec<f64> = controls
        .iter()
        .filter_map(|s| {
            let pre = s.volume_in(&windows.pre);
            let post = s.volume_in(&windows.post);
            (pre > 0.0).then(|| post / pre - 1.0)
        })
        .collect();
    mean(&rates).ok_or_else(|| {
        ImpactError::InputError(
            "No control series has volume in the pre-launch window".to_string(),
        )
    })
}

fn sibling_impact(series: &Series, windows: &LaunchWindows, growth: f64) -> SiblingImpact {
    let pre_volume = series.volume_in(&windows.pre);
    let post_volume = series.volume_in(&windows.post);
    let counterfactual_volume = pre_volume * (1.0 + growth);
    SiblingImpact {
        id: series.id().to_string(),
        pre_volume,
        post_volume,
        counterfactual_volume,
        lost_volume: (counterfactual_volume - post_volume).max(0.0),
        change_pct: (pre_volume > 0.0).then(|| (post_volume - pre_volume) / pre_volume * 100.0),
    }
}

/// Scale `components` to sum to `total`
fn rescale(components: &mut [f64; 3], total: f64) {
    let sum: f64 = components.iter().sum();
    if sum > 0.0 {
        let factor = total / sum;
        components.iter_mut().for_each(|c| *c *= factor);
    } else {
        *components = [0.0; 3];
    }
}

fn summed_volumes(series: &[&Series], range: &PeriodRange) -> Vec<f64> {
    let mut totals = vec![0.0; range.len()];
    for s in series {
        for (total, v) in totals.iter_mut().zip(s.volumes_in(range)) {
            *total += v;
        }
    }
    totals
}

fn did_panel(
    target: &Series,
    siblings: &[&Series],
    controls: &[&Series],
    windows: &LaunchWindows,
) -> DidPanel {
    let mut treated = vec![target];
    treated.extend_from_slice(siblings);
    DidPanel {
        treated_pre: summed_volumes(&treated, &windows.pre),
        treated_post: summed_volumes(&treated, &windows.post),
        control_pre: summed_volumes(controls, &windows.pre),
        control_post: summed_volumes(controls, &windows.post),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rescale() {
        let mut components = [150.0, 0.0, 0.0];
        rescale(&mut components, 100.0);
        assert_eq!(components, [100.0, 0.0, 0.0]);

        let mut components = [60.0, 30.0, 30.0];
        rescale(&mut components, 100.0);
        assert_relative_eq!(components.iter().sum::<f64>(), 100.0);
        assert_relative_eq!(components[0], 50.0);
    }

    #[test]
    fn test_rescale_to_zero_total() {
        let mut components = [0.0, 0.0, 0.0];
        rescale(&mut components, 0.0);
        assert_eq!(components, [0.0, 0.0, 0.0]);
    }
}
