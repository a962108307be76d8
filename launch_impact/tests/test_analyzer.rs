use approx::{assert_relative_eq, relative_eq};
use demand_forecast::{Granularity, Period, Series, SeriesStore};
use launch_impact::{
    classify, ControlPolicy, ImpactCategory, ImpactConfig, LaunchAnalyzer, LaunchEvent,
    ProductCatalog, ProductInfo, SignificanceOutcome, SignificanceResult, TestMethod,
};
use pretty_assertions::assert_eq;

const LAUNCH: Period = Period(6);

/// Six flat pre-launch periods followed by `post`
fn pre_post(pre: f64, post: &[f64]) -> Vec<f64> {
    let mut volumes = vec![pre; 6];
    volumes.extend_from_slice(post);
    volumes
}

struct Market {
    target: Vec<f64>,
    sibling: Vec<f64>,
    control_a: Vec<f64>,
    control_b: Vec<f64>,
    rival: Vec<f64>,
}

impl Market {
    /// Target 1000 -> 1400, sibling 500 -> 400, controls +2%, rival 300 -> 250
    fn flat() -> Self {
        Self {
            target: pre_post(1000.0, &[1400.0; 6]),
            sibling: pre_post(500.0, &[400.0; 6]),
            control_a: pre_post(200.0, &[204.0; 6]),
            control_b: pre_post(100.0, &[102.0; 6]),
            rival: pre_post(300.0, &[250.0; 6]),
        }
    }

    /// Same shape as `flat` with period-to-period noise after the launch
    fn noisy() -> Self {
        Self {
            target: pre_post(1000.0, &[1400.0, 1420.0, 1390.0, 1410.0, 1405.0, 1425.0]),
            control_a: pre_post(200.0, &[204.0, 206.0, 203.0, 205.0, 204.0, 207.0]),
            ..Self::flat()
        }
    }

    fn build(&self) -> (SeriesStore, ProductCatalog) {
        let series = [
            ("new", &self.target),
            ("classic", &self.sibling),
            ("south_a", &self.control_a),
            ("south_b", &self.control_b),
            ("rival", &self.rival),
        ]
        .iter()
        .map(|(id, volumes)| {
            let records: Vec<(f64, f64)> = volumes.iter().map(|v| (*v, v * 2.0)).collect();
            Series::from_records(*id, Period(0), &records).unwrap()
        })
        .collect();
        let store = SeriesStore::from_series(Granularity::Monthly, series).unwrap();

        let catalog = ProductCatalog::from_products(vec![
            ProductInfo::new("new", "snack", "acme")
                .with_region("north")
                .launched_at(LAUNCH),
            ProductInfo::new("classic", "snack", "acme").with_region("north"),
            ProductInfo::new("south_a", "snack", "zeta").with_region("south"),
            ProductInfo::new("south_b", "snack", "zeta").with_region("south"),
            ProductInfo::new("rival", "snack", "zeta").with_region("north"),
        ])
        .unwrap();
        (store, catalog)
    }
}

fn event() -> LaunchEvent {
    LaunchEvent::new("new", LAUNCH, "snack", "acme").with_portfolio(["classic"])
}

#[test]
fn test_cannibalization_against_grown_counterfactual() {
    let (store, catalog) = Market::flat().build();
    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
    let report = analyzer.analyze(&event()).unwrap();
    let breakdown = &report.breakdown;

    assert_eq!(report.windows.len(), 6);
    assert_eq!(breakdown.control_group, vec!["south_a", "south_b"]);
    assert_relative_eq!(breakdown.control_growth, 0.02, epsilon = 1e-12);
    assert_relative_eq!(breakdown.total_launch_volume, 2400.0);

    // 110 per period: 500 grown 2% to 510 against 400 observed
    assert_relative_eq!(breakdown.cannibalization_volume, 660.0, epsilon = 1e-9);
    assert_relative_eq!(breakdown.siblings[0].counterfactual_volume, 3060.0, epsilon = 1e-9);
    assert_relative_eq!(breakdown.siblings[0].change_pct.unwrap(), -20.0, epsilon = 1e-9);

    // Rival 1800 grown to 1836 against 1500 observed
    assert_relative_eq!(breakdown.competitor_volume, 336.0, epsilon = 1e-9);
    assert_relative_eq!(breakdown.expansion_volume, 1404.0, epsilon = 1e-9);
    assert!(breakdown.warnings.is_empty());
}

#[test]
fn test_components_reconcile_within_one_percent() {
    for market in [Market::flat(), Market::noisy()] {
        let (store, catalog) = market.build();
        let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
        let breakdown = analyzer.analyze(&event()).unwrap().breakdown;
        let total = breakdown.total_launch_volume;
        assert!((breakdown.components_total() - total).abs() <= 0.01 * total);

        let shares = breakdown.shares();
        assert_relative_eq!(
            shares.cannibalization_pct + shares.competitor_pct + shares.expansion_pct,
            100.0,
            epsilon = 1.0
        );
    }
}

#[test]
fn test_no_sibling_decline_means_no_cannibalization() {
    let market = Market {
        sibling: pre_post(500.0, &[520.0; 6]),
        ..Market::flat()
    };
    let (store, catalog) = market.build();
    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
    let breakdown = analyzer.analyze(&event()).unwrap().breakdown;
    assert_eq!(breakdown.cannibalization_volume, 0.0);
    assert_eq!(breakdown.siblings[0].lost_volume, 0.0);
}

#[test]
fn test_overshooting_components_are_rescaled() {
    // Sibling loss alone exceeds the launch volume
    let market = Market {
        sibling: pre_post(500.0, &[100.0; 6]),
        ..Market::flat()
    };
    let (store, catalog) = market.build();
    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
    let breakdown = analyzer.analyze(&event()).unwrap().breakdown;

    assert_eq!(breakdown.warnings.len(), 1);
    assert_relative_eq!(breakdown.warnings[0].mismatch, 60.0, epsilon = 1e-9);
    assert_relative_eq!(breakdown.cannibalization_volume, 2400.0, epsilon = 1e-9);
    assert_eq!(breakdown.competitor_volume, 0.0);
    assert_eq!(breakdown.expansion_volume, 0.0);
}

#[test]
fn test_flat_control_is_indeterminate_and_neutral() {
    let (store, catalog) = Market::flat().build();
    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
    let report = analyzer.analyze(&event()).unwrap();

    assert!(report.significance.is_indeterminate());
    assert_eq!(report.significance.p_value(), None);
    // Large positive net, but nothing to compare against
    assert!(report.classification.net_portfolio_delta > report.classification.threshold);
    assert_eq!(report.classification.category, ImpactCategory::Neutral);
}

#[test]
fn test_significant_growth_is_additive() {
    let (store, catalog) = Market::noisy().build();
    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
    let report = analyzer.analyze(&event().with_cost(1000.0)).unwrap();

    assert_eq!(report.significance.method, TestMethod::Bootstrap);
    assert!(report.significance.is_significant());
    assert!(report.significance.effect > 0.0);
    assert_eq!(report.classification.category, ImpactCategory::Additive);
    // Every unit sells at 2.0
    assert_relative_eq!(report.classification.average_unit_value.unwrap(), 2.0);
    assert!(report.classification.roi.unwrap() > 0.0);
}

#[test]
fn test_small_significant_gain_is_neutral() {
    let (store, catalog) = Market::noisy().build();
    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
    let report = analyzer.analyze(&event()).unwrap();

    // Shrink expansion so the net delta is 3% of the launch volume
    let mut breakdown = report.breakdown.clone();
    let total = breakdown.total_launch_volume;
    breakdown.expansion_volume = breakdown.cannibalization_volume + 0.03 * total;
    breakdown.competitor_volume =
        total - breakdown.cannibalization_volume - breakdown.expansion_volume;
    let significant = SignificanceResult {
        outcome: SignificanceOutcome::Determinate {
            p_value: 0.001,
            significant: true,
        },
        ..report.significance.clone()
    };

    let classification = classify(
        &event(),
        &breakdown,
        &significant,
        &analyzer.config().classifier,
    )
    .unwrap();
    assert!(relative_eq!(
        classification.net_portfolio_delta,
        0.03 * total,
        epsilon = 1e-9
    ));
    assert_eq!(classification.category, ImpactCategory::Neutral);
}

#[test]
fn test_analysis_is_idempotent() {
    let (store, catalog) = Market::noisy().build();
    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
    let first = analyzer.analyze(&event()).unwrap();
    let second = analyzer.analyze(&event()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_missing_control_group_is_input_error() {
    let (store, catalog) = Market::flat().build();
    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default())
        .unwrap()
        .with_policy(ControlPolicy::custom(|_, p| p.brand == "nobody"));
    let err = analyzer.analyze(&event()).unwrap_err();
    assert!(err.is_input_error());
    assert!(err.to_string().contains("control group"));
}

#[test]
fn test_launch_outside_history_is_input_error() {
    let (store, catalog) = Market::flat().build();
    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
    let late = LaunchEvent::new("new", Period(40), "snack", "acme");
    assert!(analyzer.analyze(&late).unwrap_err().is_input_error());

    let unknown = LaunchEvent::new("ghost", LAUNCH, "snack", "acme");
    assert!(analyzer.analyze(&unknown).unwrap_err().is_input_error());
}

#[test]
fn test_self_referencing_portfolio_rejected() {
    let (store, catalog) = Market::flat().build();
    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
    let event = event().with_portfolio(["classic", "new"]);
    assert!(analyzer.analyze(&event).unwrap_err().is_input_error());
}

#[test]
fn test_invalid_config_rejected() {
    let (store, catalog) = Market::flat().build();
    let mut config = ImpactConfig::default();
    config.significance.alpha = 1.5;
    assert!(LaunchAnalyzer::new(&store, &catalog, config).is_err());
}

#[test]
fn test_target_series_starting_at_launch() {
    let market = Market {
        target: pre_post(0.0, &[1400.0; 6]),
        ..Market::flat()
    };
    let (padded, catalog) = market.build();

    let mut series: Vec<Series> = padded.iter().filter(|s| s.id() != "new").cloned().collect();
    let records: Vec<(f64, f64)> = vec![(1400.0, 2800.0); 6];
    series.push(Series::from_records("new", LAUNCH, &records).unwrap());
    let trimmed = SeriesStore::from_series(Granularity::Monthly, series).unwrap();

    let config = ImpactConfig::default();
    let expected = LaunchAnalyzer::new(&padded, &catalog, config.clone())
        .unwrap()
        .analyze(&event())
        .unwrap();
    let report = LaunchAnalyzer::new(&trimmed, &catalog, config)
        .unwrap()
        .analyze(&event())
        .unwrap();

    assert_eq!(report.windows.len(), 6);
    assert_relative_eq!(report.breakdown.total_launch_volume, 8400.0);
    assert_relative_eq!(report.breakdown.cannibalization_volume, 660.0, epsilon = 1e-6);
    assert_eq!(report, expected);
}

#[test]
fn test_catalog_sibling_without_series_is_skipped() {
    let (store, mut catalog) = Market::flat().build();
    catalog
        .insert(ProductInfo::new("retired", "snack", "acme").with_region("north"))
        .unwrap();

    let event = LaunchEvent::from_catalog(&catalog, "new").unwrap();
    assert_eq!(
        event.portfolio.iter().collect::<Vec<_>>(),
        vec!["classic", "retired"]
    );

    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
    let report = analyzer.analyze(&event).unwrap();
    let breakdown = &report.breakdown;
    assert_eq!(breakdown.missing_siblings, vec!["retired".to_string()]);
    assert_eq!(breakdown.siblings.len(), 1);
    assert_eq!(breakdown.siblings[0].id, "classic");
    assert_relative_eq!(breakdown.cannibalization_volume, 660.0, epsilon = 1e-6);
}
