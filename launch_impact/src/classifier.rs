//! Net portfolio impact classification

use crate::catalog::LaunchEvent;
use crate::config::ClassifierConfig;
use crate::decomposer::SovBreakdown;
use crate::error::Result;
use crate::significance::SignificanceResult;
use serde::Serialize;
use std::fmt;

/// Direction of a launch's effect on its portfolio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImpactCategory {
    /// Grew the portfolio beyond the threshold
    Additive,
    /// Shrank the portfolio beyond the threshold
    Substitutive,
    Neutral,
}

impl fmt::Display for ImpactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImpactCategory::Additive => "additive",
            ImpactCategory::Substitutive => "substitutive",
            ImpactCategory::Neutral => "neutral",
        };
        f.write_str(label)
    }
}

/// Classification of one launch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactClassification {
    pub launch_id: String,
    /// `expansion - cannibalization`; competitor volume is portfolio-neutral
    pub net_portfolio_delta: f64,
    pub category: ImpactCategory,
    /// Threshold the net delta was compared against
    pub threshold: f64,
    pub significant: bool,
    pub observed_portfolio_volume: f64,
    pub counterfactual_portfolio_volume: f64,
    pub portfolio_growth_pct: Option<f64>,
    /// Target post-window value per unit
    pub average_unit_value: Option<f64>,
    /// Return on the launch cost, only when a cost was supplied
    pub roi: Option<f64>,
}

/// Classify a launch from its breakdown and significance
pub fn classify(
    event: &LaunchEvent,
    breakdown: &SovBreakdown,
    significance: &SignificanceResult,
    config: &ClassifierConfig,
) -> Result<ImpactClassification> {
    event.validate()?;

    let net = breakdown.expansion_volume - breakdown.cannibalization_volume;
    let threshold = config
        .absolute_tau
        .unwrap_or(config.tau_fraction * breakdown.total_launch_volume);
    let significant = significance.is_significant();

    let category = if significant && net > threshold {
        ImpactCategory::Additive
    } else if significant && net < -threshold {
        ImpactCategory::Substitutive
    } else {
        ImpactCategory::Neutral
    };

    let observed = breakdown.observed_portfolio_volume();
    let counterfactual = breakdown.counterfactual_portfolio_volume();
    let portfolio_growth_pct =
        (counterfactual > 0.0).then(|| (observed - counterfactual) / counterfactual * 100.0);

    let average_unit_value = (breakdown.target_post_volume > 0.0)
        .then(|| breakdown.target_post_value / breakdown.target_post_volume);
    let roi = match (event.cost, average_unit_value) {
        (Some(cost), Some(unit_value)) => Some(net * unit_value / cost),
        _ => None,
    };

    Ok(ImpactClassification {
        launch_id: event.target.clone(),
        net_portfolio_delta: net,
        category,
        threshold,
        significant,
        observed_portfolio_volume: observed,
        counterfactual_portfolio_volume: counterfactual,
        portfolio_growth_pct,
        average_unit_value,
        roi,
    })
}
