//! Recent launch discovery and ranking

use crate::catalog::{LaunchEvent, ProductCatalog, ProductInfo};
use crate::config::IdentificationConfig;
use crate::error::Result;
use demand_forecast::{Period, PeriodRange, Series, SeriesStore};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

/// Post-launch performance of one product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchPerformance {
    pub product_id: String,
    pub launch_period: Period,
    /// Volume from launch through the latest period
    pub total_volume: f64,
    pub total_value: f64,
    /// Value of the second early block over the first, in percent
    pub growth_rate_pct: f64,
    /// Share of all store value since the launch, in percent
    pub market_share_pct: f64,
    /// `total_value * (1 + growth_rate_pct / 100)`
    pub score: f64,
}

/// A ranked launch with the event to analyse it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifiedLaunch {
    pub performance: LaunchPerformance,
    pub event: LaunchEvent,
}

/// Rank products launched within `lookback` periods of `latest`.
///
/// Products without a series or without post-launch observations are
/// skipped. Ties in score are broken by product id.
pub fn identify_launches(
    catalog: &ProductCatalog,
    store: &SeriesStore,
    latest: Period,
    config: &IdentificationConfig,
) -> Result<Vec<IdentifiedLaunch>> {
    config.validate()?;
    let earliest = latest.offset(-(config.lookback as i64));

    let mut ranked: Vec<IdentifiedLaunch> = catalog
        .iter()
        .filter_map(|product| {
            let launch = product.launch_period?;
            if launch < earliest || launch > latest {
                return None;
            }
            let series = store.get(&product.id).ok()?;
            let performance = performance(product, launch, series, store, latest, config)?;
            let event = LaunchEvent::new(&product.id, launch, &product.category, &product.brand)
                .with_portfolio(catalog.portfolio_of(product, launch));
            Some(IdentifiedLaunch { performance, event })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.performance
            .score
            .partial_cmp(&a.performance.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.performance.product_id.cmp(&b.performance.product_id))
    });
    ranked.truncate(config.top_n);

    debug!(
        launches = ranked.len(),
        %earliest,
        %latest,
        "identified recent launches"
    );
    Ok(ranked)
}

fn performance(
    product: &ProductInfo,
    launch: Period,
    series: &Series,
    store: &SeriesStore,
    latest: Period,
    config: &IdentificationConfig,
) -> Option<LaunchPerformance> {
    let since_launch = PeriodRange::new(launch, latest.offset(1));
    if series.window(&since_launch).is_empty() {
        return None;
    }
    let total_volume = series.volume_in(&since_launch);
    let total_value = series.value_in(&since_launch);

    let k = config.early_periods as i64;
    let first = series.value_in(&PeriodRange::new(launch, launch.offset(k)));
    let next = series.value_in(&PeriodRange::new(launch.offset(k), launch.offset(2 * k)));
    let growth_rate_pct = if first > 0.0 {
        (next - first) / first * 100.0
    } else {
        0.0
    };

    let market_value: f64 = store.iter().map(|s| s.value_in(&since_launch)).sum();
    let market_share_pct = if market_value > 0.0 {
        total_value / market_value * 100.0
    } else {
        0.0
    };

    Some(LaunchPerformance {
        product_id: product.id.clone(),
        launch_period: launch,
        total_volume,
        total_value,
        growth_rate_pct,
        market_share_pct,
        score: total_value * (1.0 + growth_rate_pct / 100.0),
    })
}
