//! Infrastructure layer - browser session, page primitives, and output
//!
//! Hosts the narrow page/node interfaces the harvesting engine talks to,
//! their chromiumoxide-backed implementation, file export, and logging
//! setup.

pub mod browser;
pub mod export;
pub mod logging;
pub mod page;

// Re-export commonly used items
pub use browser::BrowserSession;
pub use export::{OutputConfig, write_outputs};
pub use logging::init_logging;
pub use page::{NodeHandle, PageDriver, PageError};
