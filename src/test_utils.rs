//! Scripted in-memory page and node doubles for engine tests
//!
//! [`MockPage`] answers structural queries from a static selector map or
//! a growth plan that adds cards per discovery round; every query is
//! counted so cascade short-circuiting is assertable. [`MockNode`] is a
//! cheap tree node whose clones share click counters.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::infrastructure::page::{NodeHandle, PageDriver, PageError};

/// One scripted DOM node. Children are registered under the selector(s)
/// they answer to; attribute selectors of the form `[name]` additionally
/// match any child carrying that attribute.
#[derive(Clone, Default)]
pub struct MockNode {
    text: String,
    attrs: BTreeMap<String, String>,
    children: Vec<(Vec<String>, MockNode)>,
    clicks: Arc<AtomicUsize>,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// Register a child answering to one selector.
    pub fn with_child(mut self, selector: &str, child: MockNode) -> Self {
        self.children.push((vec![selector.to_string()], child));
        self
    }

    pub fn click_count(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    fn matches_attr_selector(&self, selector: &str) -> bool {
        selector
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .is_some_and(|name| self.attrs.contains_key(name))
    }
}

#[async_trait]
impl NodeHandle for MockNode {
    async fn text(&self) -> Result<String, PageError> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, PageError> {
        Ok(self.attrs.get(name).cloned())
    }

    async fn dataset(&self) -> Result<BTreeMap<String, String>, PageError> {
        let mut dataset = BTreeMap::new();
        for (name, value) in &self.attrs {
            if let Some(suffix) = name.strip_prefix("data-") {
                dataset.insert(camel_case(suffix), value.clone());
            }
        }
        Ok(dataset)
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn NodeHandle>>, PageError> {
        let mut matches: Vec<Box<dyn NodeHandle>> = Vec::new();
        for (selectors, child) in &self.children {
            if selectors.iter().any(|s| s == selector) || child.matches_attr_selector(selector) {
                matches.push(Box::new(child.clone()));
            }
        }
        Ok(matches)
    }

    async fn click(&self) -> Result<(), PageError> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn camel_case(attr_suffix: &str) -> String {
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

/// Cards appear on `selector`; the visible count starts at `start` and
/// increases by `step` on every further query of that selector.
pub struct GrowthPlan {
    pub selector: &'static str,
    pub start: usize,
    pub step: usize,
}

enum Growth {
    Linear(GrowthPlan),
    /// Explicit per-query counts; the last entry repeats.
    Rounds(&'static str, Vec<usize>),
}

/// Scripted page double.
pub struct MockPage {
    url: String,
    responses: HashMap<String, Vec<MockNode>>,
    growth: Option<Growth>,
    query_counts: Mutex<HashMap<String, usize>>,
    fail_navigation: bool,
}

impl MockPage {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            responses: HashMap::new(),
            growth: None,
            query_counts: Mutex::new(HashMap::new()),
            fail_navigation: false,
        }
    }

    /// Static answer for one selector.
    pub fn with_nodes(mut self, selector: &str, nodes: Vec<MockNode>) -> Self {
        self.responses.insert(selector.to_string(), nodes);
        self
    }

    pub fn with_growth(mut self, plan: GrowthPlan) -> Self {
        self.growth = Some(Growth::Linear(plan));
        self
    }

    pub fn with_growth_rounds(mut self, selector: &'static str, counts: Vec<usize>) -> Self {
        self.growth = Some(Growth::Rounds(selector, counts));
        self
    }

    pub fn with_navigation_failure(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// How many times one selector has been queried document-wide.
    pub fn query_count(&self, selector: &str) -> usize {
        self.query_counts
            .lock()
            .expect("query counts lock")
            .get(selector)
            .copied()
            .unwrap_or(0)
    }

    fn grown_cards(&self, selector: &str, nth_query: usize) -> Option<Vec<MockNode>> {
        let count = match &self.growth {
            Some(Growth::Linear(plan)) if plan.selector == selector => {
                plan.start + plan.step * (nth_query - 1)
            }
            Some(Growth::Rounds(plan_selector, counts)) if *plan_selector == selector => *counts
                .get(nth_query - 1)
                .or(counts.last())
                .expect("growth rounds are non-empty"),
            _ => return None,
        };
        Some(
            (0..count)
                .map(|i| {
                    MockNode::new()
                        .with_attr("data-goodsno", &format!("G{i}"))
                        .with_child(
                            "dt.prd-name",
                            MockNode::new().with_text(&format!("Item {i}")),
                        )
                })
                .collect(),
        )
    }

    fn has_any_content(&self) -> bool {
        self.growth.is_some() || self.responses.values().any(|nodes| !nodes.is_empty())
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        if self.fail_navigation {
            return Err(PageError::Navigation {
                url: url.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn NodeHandle>>, PageError> {
        let nth_query = {
            let mut counts = self.query_counts.lock().expect("query counts lock");
            let entry = counts.entry(selector.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        if let Some(cards) = self.grown_cards(selector, nth_query) {
            return Ok(cards
                .into_iter()
                .map(|node| Box::new(node) as Box<dyn NodeHandle>)
                .collect());
        }

        Ok(self
            .responses
            .get(selector)
            .map(|nodes| {
                nodes
                    .iter()
                    .map(|node| Box::new(node.clone()) as Box<dyn NodeHandle>)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), PageError> {
        if self.has_any_content() {
            Ok(())
        } else {
            Err(PageError::WaitTimeout {
                what: format!("selector '{selector}'"),
                timeout,
            })
        }
    }

    async fn wait_for_network_quiescence(&self, _timeout: Duration) -> Result<(), PageError> {
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<(), PageError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self.url.clone())
    }
}
