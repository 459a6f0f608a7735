//! Scroll/click-driven incremental content loading
//!
//! Runs discovery rounds against a page that lazily grows, triggering
//! more content between rounds, until the requested card count is reached
//! or growth stalls for long enough to call the catalog exhausted. The
//! stall rule makes termination independent of any "no more items"
//! signal: load-more controls that quietly stop existing end the loop on
//! their own.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::discovery::discover_cards;
use crate::domain::selectors::{CLICKABLE_SELECTOR, LOAD_MORE_EXACT, LOAD_MORE_SUBSTRINGS};
use crate::infrastructure::page::{NodeHandle, PageDriver};

/// Loader phase, tracked explicitly so the termination conditions stay
/// independently testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    /// Waiting for the first card to appear.
    Probing,
    /// Card count increased this round.
    Growing,
    /// No growth this round; counts consecutive stalled rounds.
    Stalled { rounds: u32 },
    /// Terminal: stall ceiling reached, page considered exhausted.
    Exhausted,
    /// Terminal: requested card count reached.
    Satisfied,
}

/// Drives content growth until a target card count is reached or the
/// page stops producing.
#[derive(Debug, Clone)]
pub struct IncrementalLoader {
    /// Consecutive non-growing rounds tolerated before giving up.
    pub stall_ceiling: u32,
    /// Settle pause after each scroll.
    pub settle_interval: Duration,
    /// Bound on the per-round network-quiescence wait.
    pub quiescence_timeout: Duration,
}

impl Default for IncrementalLoader {
    fn default() -> Self {
        Self {
            stall_ceiling: 40,
            settle_interval: Duration::from_millis(500),
            quiescence_timeout: Duration::from_secs(10),
        }
    }
}

impl IncrementalLoader {
    /// Load content until at least `min_items` cards are discoverable,
    /// returning the best-known card set. The returned set can be shorter
    /// when the page exhausts first; it is never an error.
    pub async fn load_until(
        &self,
        page: &dyn PageDriver,
        min_items: usize,
    ) -> Vec<Box<dyn NodeHandle>> {
        let mut previous_count = 0usize;
        let mut stalled_rounds = 0u32;

        loop {
            let cards = discover_cards(page).await;
            let count = cards.len();

            if count >= min_items {
                info!(
                    count,
                    min_items,
                    state = ?LoaderState::Satisfied,
                    "card target reached"
                );
                return cards;
            }

            let state = if count > previous_count {
                stalled_rounds = 0;
                LoaderState::Growing
            } else if count == 0 && previous_count == 0 {
                stalled_rounds += 1;
                LoaderState::Probing
            } else {
                stalled_rounds += 1;
                LoaderState::Stalled {
                    rounds: stalled_rounds,
                }
            };
            debug!(count, previous_count, stalled_rounds, ?state, "loader round");

            if stalled_rounds >= self.stall_ceiling {
                warn!(
                    count,
                    min_items,
                    stalled_rounds,
                    state = ?LoaderState::Exhausted,
                    "no growth within stall ceiling; returning best-known set"
                );
                return cards;
            }
            previous_count = count;

            self.trigger_growth(page).await;
        }
    }

    /// One growth attempt: scroll, settle, click a load-more control when
    /// one exists, then wait for the network to calm down. Every step is
    /// degraded-continue.
    async fn trigger_growth(&self, page: &dyn PageDriver) {
        if let Err(e) = page.scroll_to_bottom().await {
            warn!(error = %e, "scroll failed");
        }
        tokio::time::sleep(self.settle_interval).await;

        match find_load_more(page).await {
            Some(control) => {
                if let Err(e) = control.click().await {
                    warn!(error = %e, "load-more click failed");
                }
            }
            None => debug!("no load-more control found"),
        }

        if let Err(e) = page.wait_for_network_quiescence(self.quiescence_timeout).await {
            // Advisory only; the next discovery round sees whatever state
            // the page settled into.
            debug!(error = %e, "network quiescence wait gave up");
        }
    }
}

/// Locate a load-more control among clickable elements: exact phrase
/// match first, case-insensitive substring as fallback.
async fn find_load_more(page: &dyn PageDriver) -> Option<Box<dyn NodeHandle>> {
    let candidates = match page.query_all(CLICKABLE_SELECTOR).await {
        Ok(candidates) => candidates,
        Err(e) => {
            debug!(error = %e, "clickable query failed");
            return None;
        }
    };

    let mut texts = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let text = match candidate.text().await {
            Ok(text) => crate::domain::selectors::normalize_whitespace(&text),
            Err(_) => String::new(),
        };
        texts.push(text);
    }

    let mut chosen = LOAD_MORE_EXACT
        .iter()
        .find_map(|&phrase| texts.iter().position(|t| t.as_str() == phrase));
    if chosen.is_none() {
        chosen = LOAD_MORE_SUBSTRINGS.iter().find_map(|fragment| {
            let fragment = fragment.to_lowercase();
            texts
                .iter()
                .position(|t| !t.is_empty() && t.to_lowercase().contains(&fragment))
        });
    }
    chosen.and_then(|index| candidates.into_iter().nth(index))
}
