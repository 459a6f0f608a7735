//! End-to-end harvest orchestration
//!
//! Owns the session lifecycle and the pipeline sequence: navigate, wait
//! for initial content, load incrementally, extract every card, then
//! dedupe, filter, and truncate into the final record list. Only
//! navigation and session acquisition are fatal; everything past them
//! degrades per card or per field.

use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::application::extraction::FieldExtractor;
use crate::application::loader::IncrementalLoader;
use crate::domain::product::Product;
use crate::domain::selectors::initial_content_selector;
use crate::infrastructure::browser::BrowserSession;
use crate::infrastructure::page::{PageDriver, PageError};

/// Failures surfaced to the caller. Everything else is logged and
/// absorbed; a short or empty result is a legitimate outcome, whether the
/// site changed layout or simply has no inventory.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("browser session unavailable")]
    SessionUnavailable(#[source] PageError),

    #[error("navigation to {url} failed")]
    NavigationFailed {
        url: String,
        #[source]
        source: PageError,
    },

    #[error("no catalog content appeared at {url}")]
    InitialContentTimeout {
        url: String,
        #[source]
        source: PageError,
    },
}

/// Tunables for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Target record count; the result never exceeds it.
    pub min_items: usize,
    pub headless: bool,
    /// Bound on the initial content wait after navigation.
    pub initial_content_timeout: Duration,
    pub loader: IncrementalLoader,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            min_items: 1000,
            headless: true,
            initial_content_timeout: Duration::from_secs(30),
            loader: IncrementalLoader::default(),
        }
    }
}

/// The harvest orchestrator. One sequential pipeline per invocation; no
/// state survives across calls.
#[derive(Debug, Default)]
pub struct Harvester {
    config: HarvestConfig,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> Self {
        Self { config }
    }

    /// Harvest one listing page end to end. The browser session is scoped
    /// to this call and released on every exit path.
    pub async fn collect(&self, url: &str) -> Result<Vec<Product>, HarvestError> {
        let session_id = Uuid::new_v4();
        let span = info_span!("harvest", %session_id);
        async {
            info!(url, min_items = self.config.min_items, "starting harvest");
            let session = BrowserSession::launch(self.config.headless)
                .await
                .map_err(HarvestError::SessionUnavailable)?;

            let result = self.collect_with_page(session.driver(), url).await;
            session.close().await;
            result
        }
        .instrument(span)
        .await
    }

    /// The pipeline after session acquisition, runnable against any page
    /// implementation.
    pub async fn collect_with_page(
        &self,
        page: &dyn PageDriver,
        url: &str,
    ) -> Result<Vec<Product>, HarvestError> {
        page.navigate(url)
            .await
            .map_err(|source| HarvestError::NavigationFailed {
                url: url.to_string(),
                source,
            })?;

        page.wait_for_selector(
            &initial_content_selector(),
            self.config.initial_content_timeout,
        )
        .await
        .map_err(|source| HarvestError::InitialContentTimeout {
            url: url.to_string(),
            source,
        })?;

        let cards = self
            .config
            .loader
            .load_until(page, self.config.min_items)
            .await;
        info!(cards = cards.len(), "incremental loading finished");

        let base_url = match page.current_url().await {
            Ok(current) => current,
            Err(e) => {
                warn!(error = %e, "current url unavailable; resolving against the input url");
                url.to_string()
            }
        };

        let extractor = FieldExtractor::new();
        let mut products = Vec::new();
        let mut seen_codes: HashSet<String> = HashSet::new();
        let mut skipped_duplicates = 0usize;
        let mut skipped_nameless = 0usize;

        for (index, card) in cards.iter().enumerate() {
            let product = extractor.extract(card.as_ref(), &base_url).await;

            if let Some(code) = &product.product_code {
                if !seen_codes.insert(code.clone()) {
                    debug!(index, %code, "skipping duplicate product code");
                    skipped_duplicates += 1;
                    continue;
                }
            }
            if !product.has_name() {
                debug!(index, code = ?product.product_code, "card produced no name");
                skipped_nameless += 1;
                continue;
            }

            products.push(product);
            if products.len() >= self.config.min_items {
                break;
            }
        }

        info!(
            products = products.len(),
            unique_codes = seen_codes.len(),
            duplicates_skipped = skipped_duplicates,
            nameless_skipped = skipped_nameless,
            "extraction summary"
        );
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{GrowthPlan, MockNode, MockPage};

    fn harvester(min_items: usize) -> Harvester {
        Harvester::new(HarvestConfig {
            min_items,
            initial_content_timeout: Duration::from_millis(50),
            loader: IncrementalLoader {
                stall_ceiling: 3,
                settle_interval: Duration::from_millis(1),
                quiescence_timeout: Duration::from_millis(1),
            },
            ..HarvestConfig::default()
        })
    }

    fn named_card(name: &str, code: &str) -> MockNode {
        MockNode::new()
            .with_attr("data-goodsno", code)
            .with_child("dt.prd-name", MockNode::new().with_text(name))
    }

    #[tokio::test]
    async fn duplicates_and_nameless_cards_are_excluded() {
        let page = MockPage::new("https://shop.example/list").with_nodes(
            "a.prd-item",
            vec![
                named_card("A", "X1"),
                named_card("B", "X1"),
                MockNode::new().with_attr("data-goodsno", "X2"),
            ],
        );

        let products = harvester(10)
            .collect_with_page(&page, "https://shop.example/list")
            .await
            .unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "A");
        assert_eq!(products[0].product_code.as_deref(), Some("X1"));
    }

    #[tokio::test]
    async fn result_is_truncated_to_min_items() {
        // Grows by 50 per round without bound; the loader stops at the
        // threshold and the pipeline truncates to exactly that many.
        let page = MockPage::new("https://shop.example/list").with_growth(GrowthPlan {
            selector: "a.prd-item",
            start: 50,
            step: 50,
        });

        let products = harvester(1000)
            .collect_with_page(&page, "https://shop.example/list")
            .await
            .unwrap();

        assert_eq!(products.len(), 1000);
        let codes: HashSet<_> = products
            .iter()
            .filter_map(|p| p.product_code.clone())
            .collect();
        assert_eq!(codes.len(), 1000);
    }

    #[tokio::test]
    async fn exhausted_page_yields_short_result() {
        let page = MockPage::new("https://shop.example/list")
            .with_nodes("a.prd-item", vec![named_card("Only One", "Z9")]);

        let products = harvester(100)
            .collect_with_page(&page, "https://shop.example/list")
            .await
            .unwrap();

        assert_eq!(products.len(), 1);
    }

    #[tokio::test]
    async fn empty_page_times_out_as_fatal() {
        let page = MockPage::new("https://shop.example/list");

        let err = harvester(10)
            .collect_with_page(&page, "https://shop.example/list")
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::InitialContentTimeout { .. }));
    }

    #[tokio::test]
    async fn navigation_failure_is_fatal() {
        let page = MockPage::new("https://shop.example/list").with_navigation_failure();

        let err = harvester(10)
            .collect_with_page(&page, "https://shop.example/list")
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::NavigationFailed { .. }));
    }

    #[tokio::test]
    async fn codes_are_pairwise_distinct_and_bounded() {
        let page = MockPage::new("https://shop.example/list").with_nodes(
            "a.prd-item",
            vec![
                named_card("A", "K1"),
                named_card("B", "K2"),
                named_card("C", "K1"),
                named_card("D", "K3"),
            ],
        );

        let products = harvester(2)
            .collect_with_page(&page, "https://shop.example/list")
            .await
            .unwrap();

        assert!(products.len() <= 2);
        let codes: Vec<_> = products.iter().filter_map(|p| p.product_code.clone()).collect();
        let unique: HashSet<_> = codes.iter().cloned().collect();
        assert_eq!(codes.len(), unique.len());
    }
}
