//! Application layer - the progressive catalog harvesting engine
//!
//! Data flows one way: harvester -> loader -> discovery -> classifier for
//! card collection, then harvester -> extraction once per discovered card.

pub mod classifier;
pub mod discovery;
pub mod extraction;
pub mod harvester;
pub mod loader;

// Re-export commonly used items
pub use extraction::FieldExtractor;
pub use harvester::{HarvestConfig, HarvestError, Harvester};
pub use loader::{IncrementalLoader, LoaderState};
