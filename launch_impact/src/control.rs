//! Control group selection for difference-in-differences counterfactuals

use crate::catalog::{LaunchEvent, ProductCatalog, ProductInfo};
use crate::error::{ImpactError, Result};
use demand_forecast::SeriesStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied control predicate
pub type ControlPredicate = Arc<dyn Fn(&LaunchEvent, &ProductInfo) -> bool + Send + Sync>;

/// Rule deciding which products are unaffected by a launch.
///
/// The launch target and its portfolio are never control members,
/// whatever the policy admits.
#[derive(Clone, Default)]
pub enum ControlPolicy {
    /// Same category, sold in a different region than the target
    #[default]
    SameCategoryOtherRegion,
    /// Same category, one of the listed brands
    ExcludedBrands(Vec<String>),
    /// Any product outside the launch category
    OtherCategories,
    /// Custom predicate over the event and a candidate product
    Custom(ControlPredicate),
}

impl fmt::Debug for ControlPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlPolicy::SameCategoryOtherRegion => write!(f, "SameCategoryOtherRegion"),
            ControlPolicy::ExcludedBrands(brands) => {
                f.debug_tuple("ExcludedBrands").field(brands).finish()
            }
            ControlPolicy::OtherCategories => write!(f, "OtherCategories"),
            ControlPolicy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl ControlPolicy {
    /// Wrap a closure as a policy
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&LaunchEvent, &ProductInfo) -> bool + Send + Sync + 'static,
    {
        ControlPolicy::Custom(Arc::new(predicate))
    }

    /// Whether the policy admits `candidate`, ignoring the portfolio exclusion
    pub fn admits(
        &self,
        event: &LaunchEvent,
        target: Option<&ProductInfo>,
        candidate: &ProductInfo,
    ) -> bool {
        match self {
            ControlPolicy::SameCategoryOtherRegion => {
                let target_region = target.and_then(|t| t.region.as_deref());
                candidate.category == event.category
                    && matches!(
                        (target_region, candidate.region.as_deref()),
                        (Some(a), Some(b)) if a != b
                    )
            }
            ControlPolicy::ExcludedBrands(brands) => {
                candidate.category == event.category && brands.contains(&candidate.brand)
            }
            ControlPolicy::OtherCategories => candidate.category != event.category,
            ControlPolicy::Custom(predicate) => predicate(event, candidate),
        }
    }

    /// Ids of the control series for `event`, in ascending id order.
    ///
    /// Only products with a series in `store` qualify. An empty group is an
    /// input error.
    pub fn select(
        &self,
        event: &LaunchEvent,
        catalog: &ProductCatalog,
        store: &SeriesStore,
    ) -> Result<Vec<String>> {
        let target = catalog.get(&event.target).ok();
        let controls: Vec<String> = catalog
            .iter()
            .filter(|p| p.id != event.target && !event.portfolio.contains(&p.id))
            .filter(|p| store.contains(&p.id))
            .filter(|p| self.admits(event, target, p))
            .map(|p| p.id.clone())
            .collect();
        if controls.is_empty() {
            return Err(ImpactError::InputError(format!(
                "No viable control group for launch '{}' under {:?}",
                event.target, self
            )));
        }
        Ok(controls)
    }
}

/// Serializable form of the built-in policies
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ControlSelection {
    #[default]
    SameCategoryOtherRegion,
    ExcludedBrands { brands: Vec<String> },
    OtherCategories,
}

impl From<ControlSelection> for ControlPolicy {
    fn from(selection: ControlSelection) -> Self {
        match selection {
            ControlSelection::SameCategoryOtherRegion => ControlPolicy::SameCategoryOtherRegion,
            ControlSelection::ExcludedBrands { brands } => ControlPolicy::ExcludedBrands(brands),
            ControlSelection::OtherCategories => ControlPolicy::OtherCategories,
        }
    }
}
