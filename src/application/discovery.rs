//! Card discovery cascade
//!
//! Probes the structural query tiers in order and commits to the first
//! tier whose classifier-filtered set is non-empty. Later tiers are never
//! queried after a success: mixing cards found through different tiers on
//! the same page risks structurally incompatible nodes being extracted
//! with the wrong field rules.

use tracing::{debug, info};

use crate::application::classifier::is_likely_card;
use crate::domain::selectors::CARD_TIERS;
use crate::infrastructure::page::{NodeHandle, PageDriver};

/// Discover the current set of product-card handles on the page.
///
/// Returns an empty set when no tier yields a usable card - callers treat
/// that as "nothing there yet", not as an error. A failed tier query is
/// logged and the cascade advances.
pub async fn discover_cards(page: &dyn PageDriver) -> Vec<Box<dyn NodeHandle>> {
    for &tier in CARD_TIERS {
        let candidates = match page.query_all(tier).await {
            Ok(candidates) => candidates,
            Err(e) => {
                debug!(tier, error = %e, "tier query failed; advancing cascade");
                continue;
            }
        };
        if candidates.is_empty() {
            debug!(tier, "tier matched nothing");
            continue;
        }

        let total = candidates.len();
        let mut cards = Vec::with_capacity(total);
        for candidate in candidates {
            if is_likely_card(candidate.as_ref()).await {
                cards.push(candidate);
            }
        }

        if !cards.is_empty() {
            info!(tier, matched = total, kept = cards.len(), "card tier selected");
            return cards;
        }
        debug!(tier, matched = total, "tier matches failed classification");
    }

    debug!("no tier yielded cards");
    Vec::new()
}
