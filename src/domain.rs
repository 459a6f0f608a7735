//! Domain layer - core entities and harvesting vocabulary
//!
//! Contains the harvested product record, the per-field resolution
//! outcome, and the data-driven locator chains describing how the
//! target catalog markup varies across site templates.

pub mod product;
pub mod selectors;

// Re-export commonly used items
pub use product::{FieldOutcome, Product};
