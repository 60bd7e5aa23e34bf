//! Synthetic views for exercising the collector without a browser.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::{GleanerError, Result};
use crate::extractor::{FieldStrategy, StrategySet};
use crate::fetcher::{ElementHandle, Fetcher};

pub const ITEM_SELECTOR: &str = ".review";
pub const AUTHOR_SELECTOR: &str = ".author";
pub const RATING_SELECTOR: &str = ".rating";
pub const TEXT_SELECTOR: &str = ".text";
pub const DATE_SELECTOR: &str = ".date";

/// Strategies matching the markup [`FakeElement::review`] produces.
pub fn fake_strategies() -> StrategySet {
    StrategySet {
        author: vec![FieldStrategy::text(AUTHOR_SELECTOR)],
        rating: vec![FieldStrategy::attribute(RATING_SELECTOR, "aria-label")],
        text: vec![FieldStrategy::text(TEXT_SELECTOR)],
        date: vec![FieldStrategy::text(DATE_SELECTOR)],
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub label: String,
    pub own_text: Option<String>,
    pub attributes: HashMap<String, String>,
    pub children: HashMap<String, String>,
    pub child_attributes: HashMap<(String, String), String>,
    pub broken: bool,
}

impl FakeElement {
    pub fn review(author: &str, rating: u8, text: &str) -> Self {
        Self::default()
            .with_child(AUTHOR_SELECTOR, author)
            .with_child_attribute(RATING_SELECTOR, "aria-label", &format!("{} stars", rating))
            .with_child(TEXT_SELECTOR, text)
    }

    pub fn rating_only(rating: u8) -> Self {
        Self::default().with_child_attribute(RATING_SELECTOR, "aria-label", &format!("{} stars", rating))
    }

    pub fn button(label: &str) -> Self {
        Self {
            label: label.to_string(),
            own_text: Some(label.to_string()),
            ..Default::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    pub fn with_child(mut self, selector: &str, text: &str) -> Self {
        self.children.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn with_child_attribute(mut self, selector: &str, name: &str, value: &str) -> Self {
        self.child_attributes
            .insert((selector.to_string(), name.to_string()), value.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    fn check(&self) -> Result<()> {
        if self.broken {
            return Err(GleanerError::Browser("stale element".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn text(&self) -> Result<Option<String>> {
        self.check()?;
        Ok(self.own_text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.attributes.get(name).cloned())
    }

    async fn child_text(&self, selector: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.children.get(selector).cloned())
    }

    async fn child_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self
            .child_attributes
            .get(&(selector.to_string(), name.to_string()))
            .cloned())
    }
}

/// A scripted view: `views[n]` is what the item selector sees after `n` scrolls.
///
/// The last view repeats once scrolling runs past the script.
#[derive(Default)]
pub struct FakeFetcher {
    views: Vec<Vec<FakeElement>>,
    endless: bool,
    extras: HashMap<String, Vec<FakeElement>>,
    failing_queries: HashSet<usize>,
    hidden_until_click: Option<String>,
    hidden_until_navigation: Option<usize>,
    failing_navigation: bool,
    queries: AtomicUsize,
    scrolls: AtomicUsize,
    navigations: Mutex<Vec<String>>,
    clicked: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new(views: Vec<Vec<FakeElement>>) -> Self {
        Self {
            views,
            ..Default::default()
        }
    }

    /// Every scroll reveals one review that was never seen before.
    pub fn endless() -> Self {
        Self {
            endless: true,
            ..Default::default()
        }
    }

    pub fn with_extra(mut self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.extras.insert(selector.to_string(), elements);
        self
    }

    /// The item query with this zero-based index fails.
    pub fn failing_query(mut self, index: usize) -> Self {
        self.failing_queries.insert(index);
        self
    }

    /// Items stay hidden until an element with `label` is clicked.
    pub fn hidden_until_click(mut self, label: &str) -> Self {
        self.hidden_until_click = Some(label.to_string());
        self
    }

    /// Items stay hidden until the `n`-th navigation (1-based).
    pub fn hidden_until_navigation(mut self, n: usize) -> Self {
        self.hidden_until_navigation = Some(n);
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.failing_navigation = true;
        self
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn clicked(&self) -> Vec<String> {
        self.clicked.lock().unwrap().clone()
    }

    fn items_hidden(&self) -> bool {
        let before_navigation = self
            .hidden_until_navigation
            .is_some_and(|n| self.navigations.lock().unwrap().len() < n);
        let before_click = match &self.hidden_until_click {
            Some(label) => !self.clicked.lock().unwrap().contains(label),
            None => false,
        };
        before_navigation || before_click
    }

    fn current_view(&self) -> Vec<FakeElement> {
        let scrolls = self.scrolls();
        if self.endless {
            return (0..=scrolls)
                .map(|i| FakeElement::review(&format!("Author {}", i), 4, &format!("Fresh review {}", i)))
                .collect();
        }
        match self.views.len() {
            0 => Vec::new(),
            len => self.views[scrolls.min(len - 1)].clone(),
        }
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        if self.failing_navigation {
            return Err(GleanerError::Browser("navigation timed out".into()));
        }
        self.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<Vec<FakeElement>> {
        if selector != ITEM_SELECTOR {
            return Ok(self.extras.get(selector).cloned().unwrap_or_default());
        }

        let index = self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing_queries.contains(&index) {
            return Err(GleanerError::Browser("selector query failed".into()));
        }
        if self.items_hidden() {
            return Ok(Vec::new());
        }
        Ok(self.current_view())
    }

    async fn scroll(&self, _container: Option<&str>) -> Result<()> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn click(&self, element: &FakeElement) -> Result<()> {
        element.check()?;
        self.clicked.lock().unwrap().push(element.label.clone());
        Ok(())
    }
}
