use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::{GleanerError, Result};

/// Placeholder substituted with the URL-encoded search query.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// One named location whose reviews are collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    /// A full URL, or a search query rendered into the search template.
    pub locator: String,
    /// Further locators, tried in order when an earlier one yields no reviews.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,
}

impl Target {
    pub fn new(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locator: locator.into(),
            fallbacks: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, locator: impl Into<String>) -> Self {
        self.fallbacks.push(locator.into());
        self
    }

    /// The primary locator followed by the fallbacks.
    pub fn locators(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.locator.as_str()).chain(self.fallbacks.iter().map(String::as_str))
    }

    pub fn is_url(&self) -> bool {
        is_url(&self.locator)
    }

    /// Resolve the primary locator into the URL the browser should open.
    pub fn resolve_url(&self, search_template: &str) -> Result<Url> {
        resolve_locator(&self.locator, search_template)
    }

    /// Resolve every locator, primary first.
    pub fn resolve_urls(&self, search_template: &str) -> Result<Vec<Url>> {
        self.locators()
            .map(|locator| resolve_locator(locator, search_template))
            .collect()
    }
}

fn is_url(locator: &str) -> bool {
    let locator = locator.trim_start();
    locator.starts_with("http://") || locator.starts_with("https://")
}

fn resolve_locator(locator: &str, search_template: &str) -> Result<Url> {
    if is_url(locator) {
        return Ok(Url::parse(locator.trim())?);
    }

    if !search_template.contains(QUERY_PLACEHOLDER) {
        return Err(GleanerError::Config(format!(
            "search URL template '{}' has no {} placeholder",
            search_template, QUERY_PLACEHOLDER
        )));
    }

    let query: String = url::form_urlencoded::byte_serialize(locator.trim().as_bytes()).collect();
    Ok(Url::parse(&search_template.replace(QUERY_PLACEHOLDER, &query))?)
}
