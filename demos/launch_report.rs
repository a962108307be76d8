//! Synthetic two-year market with one launch: forecasts every series, then
//! decomposes the launch and prints the portfolio summary.
//!
//! Run with `RUST_LOG=debug cargo run --example launch_report` for model detail.

use demand_forecast::{Granularity, Period, Series, SeriesStore};
use launch_impact::{ProductCatalog, ProductInfo};
use launch_lens::{telemetry, AnalysisConfig, LensError, Pipeline};
use std::f64::consts::PI;

const LAUNCH: i64 = 18;

fn seasonal(id: &str, level: f64, growth: f64, shift: f64) -> Result<Series, LensError> {
    let records: Vec<(f64, f64)> = (0..24)
        .map(|t| {
            let t = t as f64;
            let mut volume = level * (1.0 + growth).powf(t / 12.0)
                + 0.15 * level * (2.0 * PI * t / 12.0).sin();
            if t >= LAUNCH as f64 {
                volume += shift;
            }
            (volume.max(0.0), volume.max(0.0) * 4.5)
        })
        .collect();
    Ok(Series::from_records(id, Period(0), &records)?)
}

fn main() -> Result<(), LensError> {
    telemetry::init();

    let store = SeriesStore::from_series(
        Granularity::Monthly,
        vec![
            seasonal("crunch_original", 800.0, 0.03, -90.0)?,
            seasonal("crunch_lite", 400.0, 0.03, -20.0)?,
            seasonal("crunch_spicy", 0.0, 0.0, 260.0)?,
            seasonal("rival_chips", 600.0, 0.02, -40.0)?,
            seasonal("south_original", 700.0, 0.03, 0.0)?,
            seasonal("south_rival", 500.0, 0.02, 0.0)?,
        ],
    )?;
    let catalog = ProductCatalog::from_products(vec![
        ProductInfo::new("crunch_original", "chips", "crunch").with_region("north"),
        ProductInfo::new("crunch_lite", "chips", "crunch").with_region("north"),
        ProductInfo::new("crunch_spicy", "chips", "crunch")
            .with_name("Crunch Spicy")
            .with_region("north")
            .launched_at(Period(LAUNCH)),
        ProductInfo::new("rival_chips", "chips", "rival").with_region("north"),
        ProductInfo::new("south_original", "chips", "valley").with_region("south"),
        ProductInfo::new("south_rival", "chips", "rival").with_region("south"),
    ])?;

    let config = AnalysisConfig::from_toml_str(
        r#"
        workers = 2

        [forecast]
        horizon = 6

        [impact.control]
        policy = "same_category_other_region"
        "#,
    )?;
    let pipeline = Pipeline::new(config)?;

    println!("== Forecasts ==");
    for (id, result) in pipeline.forecast_all(&store) {
        match result {
            Ok(forecast) => {
                let next = &forecast.points[0];
                println!(
                    "{:<16} {:?}/{:?}  next {:.0} [{:.0}, {:.0}]  weights {:?}",
                    id, forecast.mode, forecast.confidence, next.point, next.lower, next.upper,
                    forecast.weights()
                );
            }
            Err(e) => println!("{:<16} failed: {}", id, e),
        }
    }

    let summary = pipeline.summarize(&store, &catalog, Period(23))?;
    println!("\n== Launches ==");
    for report in &summary.reports {
        let b = &report.breakdown;
        let shares = b.shares();
        println!(
            "{}: {:.0} units ({:.0}% cannibalization, {:.0}% competitors, {:.0}% expansion) -> {}",
            report.event.target,
            b.total_launch_volume,
            shares.cannibalization_pct,
            shares.competitor_pct,
            shares.expansion_pct,
            report.classification.category
        );
    }
    for failure in &summary.failures {
        println!("{}: {}", failure.launch_id, failure.reason);
    }

    println!("\n== By brand ==");
    for rollup in &summary.by_brand {
        println!(
            "{:<8} launches {}  net {:.0} ({:.1}%)",
            rollup.key, rollup.launches, rollup.net_impact, rollup.net_impact_pct
        );
    }
    Ok(())
}
