//! Roll-ups of launch reports by category and brand

use crate::analyzer::LaunchReport;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Launch impact summed over one key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rollup {
    pub key: String,
    pub launches: usize,
    pub total_launch_volume: f64,
    pub cannibalization_volume: f64,
    /// Sum of net portfolio deltas
    pub net_impact: f64,
    /// Net impact as a percentage of launch volume, zero without volume
    pub net_impact_pct: f64,
}

pub fn rollup_by_category(reports: &[LaunchReport]) -> Vec<Rollup> {
    rollup_by(reports, |r| r.event.category.as_str())
}

pub fn rollup_by_brand(reports: &[LaunchReport]) -> Vec<Rollup> {
    rollup_by(reports, |r| r.event.brand.as_str())
}

/// Group `reports` by `key`, largest net impact first
fn rollup_by<'a, F>(reports: &'a [LaunchReport], key: F) -> Vec<Rollup>
where
    F: Fn(&'a LaunchReport) -> &'a str,
{
    let mut groups: BTreeMap<&str, Rollup> = BTreeMap::new();
    for report in reports {
        let k = key(report);
        let entry = groups.entry(k).or_insert_with(|| Rollup {
            key: k.to_string(),
            launches: 0,
            total_launch_volume: 0.0,
            cannibalization_volume: 0.0,
            net_impact: 0.0,
            net_impact_pct: 0.0,
        });
        entry.launches += 1;
        entry.total_launch_volume += report.breakdown.total_launch_volume;
        entry.cannibalization_volume += report.breakdown.cannibalization_volume;
        entry.net_impact += report.classification.net_portfolio_delta;
    }

    let mut rollups: Vec<Rollup> = groups
        .into_values()
        .map(|mut r| {
            if r.total_launch_volume > 0.0 {
                r.net_impact_pct = r.net_impact / r.total_launch_volume * 100.0;
            }
            r
        })
        .collect();
    rollups.sort_by(|a, b| {
        b.net_impact
            .partial_cmp(&a.net_impact)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    rollups
}
