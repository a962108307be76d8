//! Significance of the launch effect on the treated portfolio

use crate::config::SignificanceConfig;
use crate::decomposer::DidPanel;
use crate::error::{ImpactError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use sov_math::stats::{is_constant, mean, std_dev, welch_t_test};
use tracing::debug;

/// Test used for the effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestMethod {
    WelchT,
    Bootstrap,
}

/// Whether a p-value could be computed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SignificanceOutcome {
    Determinate { p_value: f64, significant: bool },
    /// Degenerate comparison, reported instead of a p-value
    Indeterminate { reason: String },
}

/// DiD effect estimate with its significance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificanceResult {
    /// Mean per-period difference, observed minus counterfactual
    pub effect: f64,
    pub standard_error: Option<f64>,
    pub alpha: f64,
    pub method: TestMethod,
    /// Post periods compared
    pub periods: usize,
    pub outcome: SignificanceOutcome,
}

impl SignificanceResult {
    /// Significant at `alpha`; indeterminate results are not significant
    pub fn is_significant(&self) -> bool {
        matches!(
            self.outcome,
            SignificanceOutcome::Determinate {
                significant: true,
                ..
            }
        )
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self.outcome, SignificanceOutcome::Indeterminate { .. })
    }

    pub fn p_value(&self) -> Option<f64> {
        match self.outcome {
            SignificanceOutcome::Determinate { p_value, .. } => Some(p_value),
            SignificanceOutcome::Indeterminate { .. } => None,
        }
    }
}

/// Observed and counterfactual treated volume per post period.
///
/// `counterfactual_j = mean(treated_pre) * control_post_j / mean(control_pre)`
pub fn counterfactual_series(panel: &DidPanel) -> Option<(Vec<f64>, Vec<f64>)> {
    let treated_pre = mean(&panel.treated_pre)?;
    let control_pre = mean(&panel.control_pre)?;
    if control_pre <= 0.0 {
        return None;
    }
    let counterfactual = panel
        .control_post
        .iter()
        .map(|c| treated_pre * c / control_pre)
        .collect();
    Some((panel.treated_post.clone(), counterfactual))
}

/// Test whether the treated portfolio departs from its counterfactual.
///
/// Uses Welch's t-test from `bootstrap_threshold` post periods upward and a
/// seeded paired bootstrap below it.
pub fn test_significance(panel: &DidPanel, config: &SignificanceConfig) -> Result<SignificanceResult> {
    let periods = panel.treated_post.len();
    if periods == 0 || panel.treated_pre.is_empty() {
        return Err(ImpactError::InputError(
            "Significance test needs pre and post periods".to_string(),
        ));
    }
    if panel.control_post.len() != periods {
        return Err(ImpactError::InputError(
            "Treated and control panels cover different periods".to_string(),
        ));
    }
    let method = if periods >= config.bootstrap_threshold {
        TestMethod::WelchT
    } else {
        TestMethod::Bootstrap
    };
    let indeterminate = |effect: f64, reason: &str| SignificanceResult {
        effect,
        standard_error: None,
        alpha: config.alpha,
        method,
        periods,
        outcome: SignificanceOutcome::Indeterminate {
            reason: reason.to_string(),
        },
    };

    let Some((observed, counterfactual)) = counterfactual_series(panel) else {
        return Ok(indeterminate(0.0, "control group has no pre-launch volume"));
    };
    let differences: Vec<f64> = observed
        .iter()
        .zip(&counterfactual)
        .map(|(o, c)| o - c)
        .collect();
    let effect = mean(&differences).unwrap_or(0.0);

    if periods < 2 || is_constant(&observed) || is_constant(&counterfactual) {
        return Ok(indeterminate(effect, "zero variance in a compared arm"));
    }

    let (standard_error, p_value) = match method {
        TestMethod::WelchT => {
            let test = welch_t_test(&observed, &counterfactual)?;
            (test.standard_error, test.p_value)
        }
        TestMethod::Bootstrap => {
            bootstrap(&differences, config.bootstrap_resamples, config.seed)
        }
    };
    debug!(effect, standard_error, p_value, ?method, "launch effect tested");

    Ok(SignificanceResult {
        effect,
        standard_error: Some(standard_error),
        alpha: config.alpha,
        method,
        periods,
        outcome: SignificanceOutcome::Determinate {
            p_value,
            significant: p_value < config.alpha,
        },
    })
}

/// Paired bootstrap over periods: standard error of the mean difference and
/// a two-sided p-value for a zero mean
fn bootstrap(differences: &[f64], resamples: usize, seed: u64) -> (f64, f64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = differences.len();
    let means: Vec<f64> = (0..resamples)
        .map(|_| (0..n).map(|_| differences[rng.gen_range(0..n)]).sum::<f64>() / n as f64)
        .collect();

    let standard_error = std_dev(&means).unwrap_or(0.0);
    let at_most_zero = means.iter().filter(|m| **m <= 0.0).count();
    let at_least_zero = means.iter().filter(|m| **m >= 0.0).count();
    let tail = at_most_zero.min(at_least_zero) as f64;
    let p_value = (2.0 * (tail + 1.0) / (resamples as f64 + 1.0)).min(1.0);
    (standard_error, p_value)
}
