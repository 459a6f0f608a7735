//! Narrow asynchronous interfaces over one browser page
//!
//! The harvesting engine never touches the browser crate directly; it
//! drives these traits. That keeps discovery, extraction, and loading
//! testable against scripted in-memory pages, and keeps the browser
//! backend swappable.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failures raised by page and node primitives.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {timeout:?} waiting for {what}")]
    WaitTimeout { what: String, timeout: Duration },

    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    #[error("node interaction failed: {0}")]
    Node(String),

    #[error("browser session unavailable: {0}")]
    Session(String),
}

/// One DOM node scoped to a single harvesting session.
///
/// Handles are captured at discovery time and never persisted; a page
/// navigation invalidates them.
#[async_trait]
pub trait NodeHandle: Send + Sync {
    /// Rendered text content of the node, untrimmed.
    async fn text(&self) -> Result<String, PageError>;

    /// Value of one attribute, `None` when not present.
    async fn attribute(&self, name: &str) -> Result<Option<String>, PageError>;

    /// The node's `data-*` attributes keyed by camel-cased dataset name
    /// (`data-goods-no` becomes `goodsNo`).
    async fn dataset(&self) -> Result<BTreeMap<String, String>, PageError>;

    /// All descendants matching a CSS selector.
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn NodeHandle>>, PageError>;

    async fn click(&self) -> Result<(), PageError>;
}

/// One live listing page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate and wait for initial document readiness.
    async fn navigate(&self, url: &str) -> Result<(), PageError>;

    /// All nodes matching a CSS selector, document-wide.
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn NodeHandle>>, PageError>;

    /// Block until at least one node matches, bounded by `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
    -> Result<(), PageError>;

    /// Block until network activity settles, bounded by `timeout`. A
    /// timeout here is advisory for callers, not a hard failure.
    async fn wait_for_network_quiescence(&self, timeout: Duration) -> Result<(), PageError>;

    /// Scroll the viewport to the document bottom to trigger lazy loading.
    async fn scroll_to_bottom(&self) -> Result<(), PageError>;

    /// The page's current URL, base for resolving relative links.
    async fn current_url(&self) -> Result<String, PageError>;
}
