//! Heuristic check that a DOM node probably is a product card
//!
//! Deliberately permissive: any one signal qualifies. A false positive
//! costs one empty-name record that the orchestrator filters out; a false
//! negative silently drops inventory, which is the expensive mistake.

use tracing::debug;

use crate::domain::selectors::{
    BUNDLED_INFO_ATTR, CODE_DATASET_KEYS, NAME_SELECTORS, PRICE_SELECTORS,
};
use crate::infrastructure::page::NodeHandle;

/// `true` when the node carries any known product signal: a bundled-info
/// attribute, an identifier-like dataset key, or a descendant matching a
/// name or price locator. Read failures count as "no signal".
pub async fn is_likely_card(node: &dyn NodeHandle) -> bool {
    match node.attribute(BUNDLED_INFO_ATTR).await {
        Ok(Some(_)) => return true,
        Ok(None) => {}
        Err(e) => debug!(error = %e, "bundled-info probe failed"),
    }

    match node.dataset().await {
        Ok(dataset) => {
            if CODE_DATASET_KEYS.iter().any(|key| dataset.contains_key(*key)) {
                return true;
            }
        }
        Err(e) => debug!(error = %e, "dataset probe failed"),
    }

    for &selector in NAME_SELECTORS.iter().chain(PRICE_SELECTORS) {
        match node.query_all(selector).await {
            Ok(matches) if !matches.is_empty() => return true,
            Ok(_) => {}
            Err(e) => debug!(selector, error = %e, "descendant probe failed"),
        }
    }

    false
}
