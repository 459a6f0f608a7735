//! Harvested product record and per-field resolution outcome

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Structured representation of one harvested product card.
///
/// Every field except `name` is optional: listing markup differs across
/// desktop/mobile templates and A/B layouts, and a card missing a price or
/// an image is still worth keeping. A card missing a name is not - it is
/// filtered out by the orchestrator before counting toward the requested
/// item threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// Price as a plain integer in the site's minor-unit-free currency
    /// (won). `None` when no price text parsed - never `0`, which would
    /// read as a free item.
    pub price: Option<u64>,
    /// Catalog identifier. Unique across one harvest result set.
    pub product_code: Option<String>,
    /// Absolute URL of the product detail page.
    pub product_url: Option<String>,
    /// Absolute URL of the primary card image.
    pub image_url: Option<String>,
    /// Auxiliary attributes, free-form. Always carries `product_code` as a
    /// key when the code resolved. Ordered for stable serialization.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Product {
    /// A record with no name carries no business value.
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Result of resolving a single record field through its fallback chain.
///
/// `Absent` (no locator matched) and `Failed` (a locator matched but the
/// read threw) collapse to the same `None` in the record, but stay
/// distinguishable in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome<T> {
    Resolved(T),
    Absent,
    Failed(String),
}

impl<T> FieldOutcome<T> {
    /// Collapse to an `Option`, logging read failures for the given field.
    pub fn into_option(self, field: &str) -> Option<T> {
        match self {
            FieldOutcome::Resolved(value) => Some(value),
            FieldOutcome::Absent => None,
            FieldOutcome::Failed(reason) => {
                debug!(field, %reason, "field read failed; leaving unresolved");
                None
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, FieldOutcome::Resolved(_))
    }
}
