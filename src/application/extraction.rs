//! Best-effort field extraction from one product card
//!
//! Each record field is resolved independently through its own ordered
//! fallback chain; chains share no failure state. A broken field degrades
//! to "unresolved" and never aborts the card - one missing attribute must
//! not lose an otherwise-valid record.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::domain::product::{FieldOutcome, Product};
use crate::domain::selectors::{
    BUNDLED_INFO_ATTR, CODE_ATTRIBUTES, CODE_DATASET_KEYS, IMAGE_SELECTORS, NAME_SELECTORS,
    PRICE_PATTERN, PRICE_SELECTORS, normalize_whitespace,
};
use crate::infrastructure::page::NodeHandle;

/// Stateless extractor applying the locator chains in
/// [`crate::domain::selectors`] to one card handle.
#[derive(Debug, Default)]
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Produce a record from one card. Infallible by design: every field
    /// failure is absorbed into the corresponding `None`.
    pub async fn extract(&self, card: &dyn NodeHandle, base_url: &str) -> Product {
        let (name, product_url) = self.resolve_name_and_url(card, base_url).await;
        let price = self.resolve_price(card).await.into_option("price");
        let product_code = self.resolve_code(card).await.into_option("product_code");
        let image_url = self
            .resolve_image(card, base_url)
            .await
            .into_option("image_url");
        let metadata = self.resolve_metadata(card, product_code.as_deref()).await;

        Product {
            name: name.into_option("name").unwrap_or_default(),
            price,
            product_code,
            product_url: product_url.into_option("product_url"),
            image_url,
            metadata,
        }
    }

    /// Name locators in priority order; the first pattern yielding
    /// non-empty text supplies the name and, when it carries one, the
    /// product link. A matched node without text does not stop the chain.
    async fn resolve_name_and_url(
        &self,
        card: &dyn NodeHandle,
        base_url: &str,
    ) -> (FieldOutcome<String>, FieldOutcome<String>) {
        let mut failure: Option<String> = None;
        for &selector in NAME_SELECTORS {
            let nodes = match card.query_all(selector).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    failure = Some(e.to_string());
                    continue;
                }
            };
            for node in &nodes {
                let text = match node.text().await {
                    Ok(text) => normalize_whitespace(&text),
                    Err(e) => {
                        failure = Some(e.to_string());
                        continue;
                    }
                };
                if text.is_empty() {
                    continue;
                }

                let href = match node.attribute("href").await {
                    Ok(Some(href)) => Some(href),
                    // The card root is often the anchor wrapping the
                    // whole tile; fall back to its link.
                    Ok(None) => card.attribute("href").await.ok().flatten(),
                    Err(e) => {
                        debug!(selector, error = %e, "href read failed");
                        None
                    }
                };
                let url = href
                    .and_then(|href| resolve_url(base_url, &href))
                    .map_or(FieldOutcome::Absent, FieldOutcome::Resolved);
                return (FieldOutcome::Resolved(text), url);
            }
        }
        let name = match failure {
            Some(reason) => FieldOutcome::Failed(reason),
            None => FieldOutcome::Absent,
        };
        (name, FieldOutcome::Absent)
    }

    /// Price locators in priority order; first parseable digit group wins.
    async fn resolve_price(&self, card: &dyn NodeHandle) -> FieldOutcome<u64> {
        let mut failure: Option<String> = None;
        for &selector in PRICE_SELECTORS {
            let nodes = match card.query_all(selector).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    failure = Some(e.to_string());
                    continue;
                }
            };
            for node in &nodes {
                match node.text().await {
                    Ok(text) => {
                        if let Some(price) = parse_price(&text) {
                            return FieldOutcome::Resolved(price);
                        }
                    }
                    Err(e) => failure = Some(e.to_string()),
                }
            }
        }
        match failure {
            Some(reason) => FieldOutcome::Failed(reason),
            None => FieldOutcome::Absent,
        }
    }

    /// Catalog identifier: direct attributes on the card root first, the
    /// same attribute names on descendants second (identifiers are
    /// sometimes attached to nested action elements), dataset key
    /// variants last.
    async fn resolve_code(&self, card: &dyn NodeHandle) -> FieldOutcome<String> {
        let mut failure: Option<String> = None;

        for &attr in CODE_ATTRIBUTES {
            match card.attribute(attr).await {
                Ok(Some(value)) if !value.is_empty() => {
                    return FieldOutcome::Resolved(value);
                }
                Ok(_) => {}
                Err(e) => failure = Some(e.to_string()),
            }
        }

        for &attr in CODE_ATTRIBUTES {
            let selector = format!("[{attr}]");
            match card.query_all(&selector).await {
                Ok(nodes) => {
                    for node in &nodes {
                        match node.attribute(attr).await {
                            Ok(Some(value)) if !value.is_empty() => {
                                return FieldOutcome::Resolved(value);
                            }
                            Ok(_) => {}
                            Err(e) => failure = Some(e.to_string()),
                        }
                    }
                }
                Err(e) => failure = Some(e.to_string()),
            }
        }

        match card.dataset().await {
            Ok(dataset) => {
                for key in CODE_DATASET_KEYS {
                    if let Some(value) = dataset.get(*key) {
                        if !value.is_empty() {
                            return FieldOutcome::Resolved(value.clone());
                        }
                    }
                }
            }
            Err(e) => failure = Some(e.to_string()),
        }

        match failure {
            Some(reason) => FieldOutcome::Failed(reason),
            None => FieldOutcome::Absent,
        }
    }

    /// Image locators in priority order; `src`, then lazy-load
    /// `data-src`, then the first URL token of `srcset`.
    async fn resolve_image(&self, card: &dyn NodeHandle, base_url: &str) -> FieldOutcome<String> {
        let mut failure: Option<String> = None;
        for &selector in IMAGE_SELECTORS {
            let nodes = match card.query_all(selector).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    failure = Some(e.to_string());
                    continue;
                }
            };
            let Some(node) = nodes.first() else {
                continue;
            };

            let mut source = None;
            for attr in ["src", "data-src"] {
                match node.attribute(attr).await {
                    Ok(Some(value)) if !value.is_empty() => {
                        source = Some(value);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => failure = Some(e.to_string()),
                }
            }
            if source.is_none() {
                match node.attribute("srcset").await {
                    Ok(Some(srcset)) => {
                        source = srcset.split_whitespace().next().map(str::to_string);
                    }
                    Ok(None) => {}
                    Err(e) => failure = Some(e.to_string()),
                }
            }

            if let Some(src) = source {
                if let Some(absolute) = normalize_image_url(base_url, &src) {
                    return FieldOutcome::Resolved(absolute);
                }
            }
        }
        match failure {
            Some(reason) => FieldOutcome::Failed(reason),
            None => FieldOutcome::Absent,
        }
    }

    /// Seed with the resolved code, then merge the bundled-info JSON when
    /// present. Malformed JSON is supplementary data and swallowed.
    async fn resolve_metadata(
        &self,
        card: &dyn NodeHandle,
        product_code: Option<&str>,
    ) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        if let Some(code) = product_code {
            metadata.insert("product_code".to_string(), code.to_string());
        }

        match card.attribute(BUNDLED_INFO_ATTR).await {
            Ok(Some(raw)) => match serde_json::from_str::<serde_json::Map<String, Value>>(&raw) {
                Ok(bundle) => {
                    for (key, value) in bundle {
                        let value = match value {
                            Value::String(s) => s,
                            other => other.to_string(),
                        };
                        metadata.insert(key, value);
                    }
                }
                Err(e) => debug!(error = %e, "bundled-info attribute is not valid json"),
            },
            Ok(None) => {}
            Err(e) => debug!(error = %e, "bundled-info read failed"),
        }

        metadata
    }
}

/// Parse a displayed price into its integer value. `None` when the text
/// contains no digit group - never `0` for absent text.
pub fn parse_price(text: &str) -> Option<u64> {
    let normalized = normalize_whitespace(text);
    let group = PRICE_PATTERN.find(&normalized)?;
    group.as_str().replace(',', "").parse().ok()
}

/// Resolve an href against the page URL. Absolute inputs pass through.
fn resolve_url(base_url: &str, href: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    base.join(href).ok().map(|joined| joined.to_string())
}

/// Image sources additionally appear protocol-relative (`//cdn...`).
fn normalize_image_url(base_url: &str, src: &str) -> Option<String> {
    if let Some(rest) = src.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    resolve_url(base_url, src)
}
