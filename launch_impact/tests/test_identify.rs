use approx::assert_relative_eq;
use demand_forecast::{Granularity, Period, Series, SeriesStore};
use launch_impact::{identify_launches, IdentificationConfig, ProductCatalog, ProductInfo};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

const LATEST: Period = Period(11);

fn values(values: &[f64]) -> Vec<(f64, f64)> {
    values.iter().map(|v| (v / 10.0, *v)).collect()
}

#[fixture]
fn market() -> (ProductCatalog, SeriesStore) {
    let catalog = ProductCatalog::from_products(vec![
        ProductInfo::new("old", "snack", "acme"),
        ProductInfo::new("ancient", "snack", "zeta").launched_at(Period(-20)),
        ProductInfo::new("new_a", "snack", "acme").launched_at(Period(2)),
        ProductInfo::new("new_b", "snack", "acme").launched_at(Period(5)),
        ProductInfo::new("unsold", "snack", "acme").launched_at(Period(4)),
    ])
    .unwrap();

    let mut new_a = vec![100.0; 3];
    new_a.extend([150.0; 7]);
    let store = SeriesStore::from_series(
        Granularity::Monthly,
        vec![
            Series::from_records("old", Period(0), &values(&[1000.0; 12])).unwrap(),
            Series::from_records("ancient", Period(0), &values(&[10.0; 12])).unwrap(),
            Series::from_records("new_a", Period(2), &values(&new_a)).unwrap(),
            Series::from_records("new_b", Period(5), &values(&[200.0; 7])).unwrap(),
        ],
    )
    .unwrap();
    (catalog, store)
}

#[rstest]
fn test_ranks_recent_launches_by_score(market: (ProductCatalog, SeriesStore)) {
    let (catalog, store) = market;
    let launches =
        identify_launches(&catalog, &store, LATEST, &IdentificationConfig::default()).unwrap();

    let ids: Vec<&str> = launches
        .iter()
        .map(|l| l.performance.product_id.as_str())
        .collect();
    assert_eq!(ids, vec!["new_a", "new_b"]);

    let top = &launches[0].performance;
    assert_relative_eq!(top.total_value, 1350.0);
    assert_relative_eq!(top.total_volume, 135.0);
    assert_relative_eq!(top.growth_rate_pct, 50.0);
    assert_relative_eq!(top.score, 2025.0);

    let second = &launches[1].performance;
    assert_relative_eq!(second.growth_rate_pct, 0.0);
    // 1400 of 1400 + 1050 + 7000 + 70 since period 5
    assert_relative_eq!(second.market_share_pct, 1400.0 / 9520.0 * 100.0, epsilon = 1e-9);
}

#[rstest]
fn test_events_carry_earlier_portfolio(market: (ProductCatalog, SeriesStore)) {
    let (catalog, store) = market;
    let launches =
        identify_launches(&catalog, &store, LATEST, &IdentificationConfig::default()).unwrap();

    let a = &launches[0].event;
    assert_eq!(a.launch_period, Period(2));
    assert_eq!(a.portfolio.iter().collect::<Vec<_>>(), vec!["old"]);

    let b = &launches[1].event;
    assert_eq!(
        b.portfolio.iter().collect::<Vec<_>>(),
        vec!["new_a", "old", "unsold"]
    );
}

#[rstest]
#[case(1, vec!["new_a"])]
#[case(5, vec!["new_a", "new_b"])]
fn test_top_n(
    market: (ProductCatalog, SeriesStore),
    #[case] top_n: usize,
    #[case] expected: Vec<&str>,
) {
    let (catalog, store) = market;
    let config = IdentificationConfig {
        top_n,
        ..IdentificationConfig::default()
    };
    let launches = identify_launches(&catalog, &store, LATEST, &config).unwrap();
    let ids: Vec<&str> = launches
        .iter()
        .map(|l| l.performance.product_id.as_str())
        .collect();
    assert_eq!(ids, expected);
}

#[rstest]
fn test_lookback_limits_launches(market: (ProductCatalog, SeriesStore)) {
    let (catalog, store) = market;
    let config = IdentificationConfig {
        lookback: 6,
        ..IdentificationConfig::default()
    };
    let launches = identify_launches(&catalog, &store, LATEST, &config).unwrap();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].performance.product_id, "new_b");
}

#[test]
fn test_equal_scores_ordered_by_id() {
    let catalog = ProductCatalog::from_products(vec![
        ProductInfo::new("zz", "snack", "acme").launched_at(Period(1)),
        ProductInfo::new("aa", "snack", "acme").launched_at(Period(1)),
    ])
    .unwrap();
    let store = SeriesStore::from_series(
        Granularity::Monthly,
        vec![
            Series::from_records("zz", Period(1), &values(&[50.0; 6])).unwrap(),
            Series::from_records("aa", Period(1), &values(&[50.0; 6])).unwrap(),
        ],
    )
    .unwrap();
    let launches =
        identify_launches(&catalog, &store, Period(6), &IdentificationConfig::default()).unwrap();
    assert_eq!(launches[0].performance.product_id, "aa");
    assert_eq!(launches[1].performance.product_id, "zz");
}

#[test]
fn test_rejects_zero_top_n() {
    let config = IdentificationConfig {
        top_n: 0,
        ..IdentificationConfig::default()
    };
    let result = identify_launches(
        &ProductCatalog::new(),
        &SeriesStore::new(Granularity::Monthly),
        LATEST,
        &config,
    );
    assert!(result.is_err());
}
