//! Catalog Harvester - adaptive product harvesting for dynamically
//! rendered e-commerce listing pages
//!
//! Listing markup on the target catalog is inconsistent across page
//! variants (desktop/mobile templates, A/B layouts, infinite scroll vs.
//! pagination), so every step of the pipeline runs on ordered fallback
//! heuristics: card discovery cascades through structural query tiers, a
//! permissive classifier filters candidates, per-field extraction chains
//! tolerate missing or renamed attributes, and an incremental loader
//! keeps triggering content growth until the target count is reached or
//! the page stalls out.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub mod test_utils;

// Re-export the public surface
pub use application::{HarvestConfig, HarvestError, Harvester, IncrementalLoader, LoaderState};
pub use domain::Product;
pub use infrastructure::{OutputConfig, init_logging, write_outputs};
