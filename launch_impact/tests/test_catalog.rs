use demand_forecast::{Granularity, SeriesStore};
use launch_impact::{ImpactConfig, LaunchAnalyzer, LaunchEvent, ProductCatalog};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn sales_csv() -> String {
    let mut csv = String::from("series_id,period,volume,value\n");
    for month in 1..=12 {
        let launched = month >= 7;
        let rows = [
            ("NEW", if launched { 300.0 + month as f64 } else { 0.0 }),
            ("CORE", if launched { 450.0 - month as f64 } else { 500.0 }),
            ("SOUTH", 200.0 + (month % 3) as f64),
        ];
        for (id, volume) in rows {
            csv.push_str(&format!("{},2024-{:02},{},{}\n", id, month, volume, volume * 2.5));
        }
    }
    csv
}

const CATALOG: &str = "\
product_id,name,category,brand,region,launch_period
NEW,Crunch Spicy,chips,crunch,north,2024-07
CORE,Crunch Original,chips,crunch,north,
SOUTH,Valley Chips,chips,valley,south,
";

#[test]
fn test_analysis_from_csv_files() {
    let sales = write_csv(&sales_csv());
    let products = write_csv(CATALOG);

    let store = SeriesStore::from_csv(sales.path(), Granularity::Monthly).unwrap();
    let catalog = ProductCatalog::from_csv(products.path(), Granularity::Monthly).unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.get("NEW").unwrap().name.as_deref(), Some("Crunch Spicy"));
    assert_eq!(catalog.get("CORE").unwrap().launch_period, None);

    let event = LaunchEvent::from_catalog(&catalog, "NEW").unwrap();
    assert_eq!(event.portfolio.iter().collect::<Vec<_>>(), vec!["CORE"]);

    let analyzer = LaunchAnalyzer::new(&store, &catalog, ImpactConfig::default()).unwrap();
    let report = analyzer.analyze(&event).unwrap();
    assert_eq!(report.windows.len(), 6);
    assert_eq!(report.breakdown.control_group, vec!["SOUTH"]);
    assert!(report.breakdown.cannibalization_volume > 0.0);
    assert!(report.to_json().unwrap().contains("\"launch_id\": \"NEW\""));
}

#[test]
fn test_bad_launch_period_is_rejected() {
    let products = write_csv(
        "product_id,name,category,brand,region,launch_period\nX,,chips,crunch,north,July\n",
    );
    let err = ProductCatalog::from_csv(products.path(), Granularity::Monthly).unwrap_err();
    assert!(err.is_input_error());
}

#[test]
fn test_missing_catalog_file() {
    let err = ProductCatalog::from_csv("/nonexistent/products.csv", Granularity::Monthly)
        .unwrap_err();
    assert!(!err.is_input_error());
}
