//! chromiumoxide-backed browser session and page primitives
//!
//! One session per `collect()` call: launch, drain the CDP event handler
//! on a background task, expose a single page through [`PageDriver`], and
//! tear everything down on close. Chromium exposes no load-state event
//! ladder through this crate, so selector waits poll the DOM and network
//! quiescence is a resource-count stability heuristic.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use crate::infrastructure::page::{NodeHandle, PageDriver, PageError};

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);
const QUIESCENCE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Scoped browser session. Acquired once per harvest, released on every
/// exit path by [`BrowserSession::close`].
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: CdpPage,
}

impl BrowserSession {
    /// Launch a Chromium instance and open a blank page.
    pub async fn launch(headless: bool) -> Result<Self, PageError> {
        let mut builder = BrowserConfig::builder().window_size(1440, 2400);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(PageError::Session)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| PageError::Session(e.to_string()))?;

        // The handler stream must be polled for the whole session lifetime
        // or every CDP call deadlocks.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "cdp handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PageError::Session(e.to_string()))?;

        info!(headless, "browser session launched");
        Ok(Self {
            browser,
            handler_task,
            page: CdpPage { page },
        })
    }

    pub fn driver(&self) -> &dyn PageDriver {
        &self.page
    }

    /// Close the browser and stop the handler task. Best effort: a failed
    /// close is logged, never surfaced.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "browser process wait failed");
        }
        self.handler_task.abort();
        info!("browser session closed");
    }
}

/// [`PageDriver`] over one chromiumoxide page.
pub struct CdpPage {
    page: Page,
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        let navigation = timeout(NAVIGATION_TIMEOUT, self.page.goto(url)).await;
        match navigation {
            Ok(Ok(_)) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| url.to_string());
                info!(%final_url, "navigation complete");
                Ok(())
            }
            Ok(Err(e)) => Err(PageError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(PageError::Navigation {
                url: url.to_string(),
                reason: format!("timed out after {NAVIGATION_TIMEOUT:?}"),
            }),
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn NodeHandle>>, PageError> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| PageError::Node(format!("query '{selector}' failed: {e}")))?;
        Ok(elements
            .into_iter()
            .map(|element| Box::new(CdpNode { element }) as Box<dyn NodeHandle>)
            .collect())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), PageError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.page.find_elements(selector).await {
                Ok(elements) if !elements.is_empty() => return Ok(()),
                Ok(_) => {}
                Err(e) => debug!(selector, error = %e, "selector poll failed"),
            }
            if Instant::now() >= deadline {
                return Err(PageError::WaitTimeout {
                    what: format!("selector '{selector}'"),
                    timeout,
                });
            }
            sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn wait_for_network_quiescence(&self, timeout: Duration) -> Result<(), PageError> {
        let deadline = Instant::now() + timeout;
        let mut last_count: Option<u64> = None;
        loop {
            let count = self
                .page
                .evaluate("performance.getEntriesByType('resource').length")
                .await
                .map_err(|e| PageError::Evaluation(e.to_string()))?
                .into_value::<u64>()
                .map_err(|e| PageError::Evaluation(e.to_string()))?;

            // Two identical consecutive samples count as settled.
            if last_count == Some(count) {
                debug!(resources = count, "network settled");
                return Ok(());
            }
            last_count = Some(count);

            if Instant::now() >= deadline {
                return Err(PageError::WaitTimeout {
                    what: "network quiescence".to_string(),
                    timeout,
                });
            }
            sleep(QUIESCENCE_POLL_INTERVAL).await;
        }
    }

    async fn scroll_to_bottom(&self) -> Result<(), PageError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(|e| PageError::Evaluation(e.to_string()))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, PageError> {
        self.page
            .url()
            .await
            .map_err(|e| PageError::Evaluation(e.to_string()))?
            .ok_or_else(|| PageError::Evaluation("page reported no url".to_string()))
    }
}

/// [`NodeHandle`] over one chromiumoxide element.
pub struct CdpNode {
    element: Element,
}

#[async_trait]
impl NodeHandle for CdpNode {
    async fn text(&self) -> Result<String, PageError> {
        let text = self
            .element
            .inner_text()
            .await
            .map_err(|e| PageError::Node(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, PageError> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| PageError::Node(e.to_string()))
    }

    async fn dataset(&self) -> Result<BTreeMap<String, String>, PageError> {
        let raw = self
            .element
            .attributes()
            .await
            .map_err(|e| PageError::Node(e.to_string()))?;
        // DOM.getAttributes returns a flat interleaved name/value list.
        let mut dataset = BTreeMap::new();
        for pair in raw.chunks_exact(2) {
            if let Some(rest) = pair[0].strip_prefix("data-") {
                dataset.insert(dataset_key(rest), pair[1].clone());
            }
        }
        Ok(dataset)
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn NodeHandle>>, PageError> {
        let elements = self
            .element
            .find_elements(selector)
            .await
            .map_err(|e| PageError::Node(format!("query '{selector}' failed: {e}")))?;
        Ok(elements
            .into_iter()
            .map(|element| Box::new(CdpNode { element }) as Box<dyn NodeHandle>)
            .collect())
    }

    async fn click(&self) -> Result<(), PageError> {
        self.element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| PageError::Node(e.to_string()))
    }
}

/// Camel-case a `data-*` attribute suffix the way `element.dataset` does:
/// `goods-no` becomes `goodsNo`.
fn dataset_key(attr_suffix: &str) -> String {
    let mut key = String::with_capacity(attr_suffix.len());
    let mut upper_next = false;
    for ch in attr_suffix.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            key.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            key.push(ch);
        }
    }
    key
}
