//! Product metadata and launch events

use crate::error::{ImpactError, Result};
use demand_forecast::{Granularity, Period};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Metadata for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: String,
    pub name: Option<String>,
    pub category: String,
    pub brand: String,
    pub region: Option<String>,
    /// First period on sale, `None` for long-established lines
    pub launch_period: Option<Period>,
}

impl ProductInfo {
    pub fn new(id: impl Into<String>, category: impl Into<String>, brand: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            category: category.into(),
            brand: brand.into(),
            region: None,
            launch_period: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn launched_at(mut self, period: Period) -> Self {
        self.launch_period = Some(period);
        self
    }

    /// Whether the product was on sale before `period`
    pub fn launched_before(&self, period: Period) -> bool {
        self.launch_period.map_or(true, |p| p < period)
    }
}

/// Row of the catalog CSV accepted by [`ProductCatalog::from_csv`]
#[derive(Debug, Deserialize)]
struct ProductRecord {
    product_id: String,
    #[serde(default)]
    name: Option<String>,
    category: String,
    brand: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    launch_period: Option<String>,
}

/// Products keyed by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductCatalog {
    products: BTreeMap<String, ProductInfo>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting duplicate ids
    pub fn from_products(products: Vec<ProductInfo>) -> Result<Self> {
        let mut catalog = Self::new();
        for product in products {
            catalog.insert(product)?;
        }
        Ok(catalog)
    }

    /// Load a catalog with columns
    /// `product_id,name,category,brand,region,launch_period`
    pub fn from_csv<P: AsRef<Path>>(path: P, granularity: Granularity) -> Result<Self> {
        Self::from_reader(File::open(path)?, granularity)
    }

    /// Load a catalog from any CSV reader
    pub fn from_reader<R: Read>(reader: R, granularity: Granularity) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut catalog = Self::new();
        for record in csv_reader.deserialize() {
            let record: ProductRecord = record?;
            let launch_period = match record.launch_period.as_deref() {
                Some(text) if !text.is_empty() => Some(granularity.parse_period(text)?),
                _ => None,
            };
            catalog.insert(ProductInfo {
                id: record.product_id,
                name: record.name.filter(|n| !n.is_empty()),
                category: record.category,
                brand: record.brand,
                region: record.region.filter(|r| !r.is_empty()),
                launch_period,
            })?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, product: ProductInfo) -> Result<()> {
        if self.products.contains_key(&product.id) {
            return Err(ImpactError::InputError(format!(
                "Duplicate product id '{}'",
                product.id
            )));
        }
        self.products.insert(product.id.clone(), product);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&ProductInfo> {
        self.products
            .get(id)
            .ok_or_else(|| ImpactError::InputError(format!("Unknown product id '{}'", id)))
    }

    /// Products in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &ProductInfo> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Existing products a launch may cannibalise: same category and brand,
    /// on sale before the launch
    pub fn portfolio_of(&self, target: &ProductInfo, launch: Period) -> BTreeSet<String> {
        self.iter()
            .filter(|p| {
                p.id != target.id
                    && p.category == target.category
                    && p.brand == target.brand
                    && p.launched_before(launch)
            })
            .map(|p| p.id.clone())
            .collect()
    }
}

/// A product launch to analyse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchEvent {
    /// Id of the launched product's series
    pub target: String,
    pub launch_period: Period,
    pub category: String,
    pub brand: String,
    /// Sibling products that may be cannibalised
    pub portfolio: BTreeSet<String>,
    /// Launch cost, enables the ROI estimate
    pub cost: Option<f64>,
}

impl LaunchEvent {
    pub fn new(
        target: impl Into<String>,
        launch_period: Period,
        category: impl Into<String>,
        brand: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            launch_period,
            category: category.into(),
            brand: brand.into(),
            portfolio: BTreeSet::new(),
            cost: None,
        }
    }

    /// Build the event for a catalogued product from its launch period
    pub fn from_catalog(catalog: &ProductCatalog, target: &str) -> Result<Self> {
        let product = catalog.get(target)?;
        let launch = product.launch_period.ok_or_else(|| {
            ImpactError::InputError(format!("Product '{}' has no launch period", target))
        })?;
        Ok(Self::new(target, launch, &product.category, &product.brand)
            .with_portfolio(catalog.portfolio_of(product, launch)))
    }

    pub fn with_portfolio<I, S>(mut self, siblings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.portfolio = siblings.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Reject self-referencing portfolios and non-positive costs
    pub fn validate(&self) -> Result<()> {
        if self.portfolio.contains(&self.target) {
            return Err(ImpactError::InputError(format!(
                "Launch '{}' lists itself as a portfolio sibling",
                self.target
            )));
        }
        if let Some(cost) = self.cost {
            if !(cost > 0.0) {
                return Err(ImpactError::InputError(format!(
                    "Launch cost for '{}' must be positive, got {}",
                    self.target, cost
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> ProductCatalog {
        ProductCatalog::from_products(vec![
            ProductInfo::new("new", "shampoo", "acme").launched_at(Period(10)),
            ProductInfo::new("old", "shampoo", "acme").launched_at(Period(2)),
            ProductInfo::new("legacy", "shampoo", "acme"),
            ProductInfo::new("later", "shampoo", "acme").launched_at(Period(12)),
            ProductInfo::new("rival", "shampoo", "other"),
            ProductInfo::new("soap", "soap", "acme"),
        ])
        .unwrap()
    }

    #[test]
    fn test_event_from_catalog() {
        let event = LaunchEvent::from_catalog(&catalog(), "new").unwrap();
        assert_eq!(event.launch_period, Period(10));
        assert_eq!(
            event.portfolio.iter().cloned().collect::<Vec<_>>(),
            vec!["legacy".to_string(), "old".to_string()]
        );
    }

    #[test]
    fn test_event_requires_launch_period() {
        let err = LaunchEvent::from_catalog(&catalog(), "legacy").unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_duplicate_product_rejected() {
        let result = ProductCatalog::from_products(vec![
            ProductInfo::new("a", "c", "b"),
            ProductInfo::new("a", "c", "b"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_cost_and_portfolio() {
        let event = LaunchEvent::new("a", Period(0), "c", "b");
        assert!(event.clone().with_cost(100.0).validate().is_ok());
        assert!(event.clone().with_cost(0.0).validate().is_err());
        assert!(event.with_portfolio(["a"]).validate().is_err());
    }

    #[test]
    fn test_catalog_from_reader() {
        let data = "product_id,name,category,brand,region,launch_period\n\
                    p1,Mint,shampoo,acme,north,2024-03\n\
                    p2,,shampoo,acme,,\n";
        let catalog = ProductCatalog::from_reader(data.as_bytes(), Granularity::Monthly).unwrap();
        let p1 = catalog.get("p1").unwrap();
        assert_eq!(p1.region.as_deref(), Some("north"));
        assert_eq!(p1.launch_period, Some(Period(2024 * 12 + 2)));
        let p2 = catalog.get("p2").unwrap();
        assert_eq!(p2.name, None);
        assert_eq!(p2.launch_period, None);
    }
}
