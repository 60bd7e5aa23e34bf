//! Browser capabilities the collector consumes.
//!
//! The collector never talks to a browser directly. It asks a [`Fetcher`] for
//! element handles and drives scrolling and clicking through it, which keeps
//! the collection algorithm testable against synthetic views.

pub mod chrome;
pub mod config;
#[cfg(test)]
pub mod fake;

pub use chrome::ChromeSession;
pub use config::BrowserSettings;

use async_trait::async_trait;

use crate::app::Result;

/// An opaque handle to one element of the current view.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Rendered text of the element itself.
    async fn text(&self) -> Result<Option<String>>;

    /// Attribute on the element itself.
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Rendered text of the first descendant matching `selector`.
    ///
    /// A missing descendant is `Ok(None)`, not an error.
    async fn child_text(&self, selector: &str) -> Result<Option<String>>;

    /// Attribute of the first descendant matching `selector`.
    async fn child_attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;
}

/// A controlled browser view.
#[async_trait]
pub trait Fetcher: Send + Sync {
    type Element: ElementHandle;

    async fn navigate(&self, url: &str) -> Result<()>;

    /// All elements currently matching `selector`.
    async fn find(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// Scroll `container` to its end, or the window when `None` or not found.
    async fn scroll(&self, container: Option<&str>) -> Result<()>;

    async fn click(&self, element: &Self::Element) -> Result<()>;
}

/// Click the first element matching any of `selectors`, in order.
///
/// Returns the selector that was clicked. Lookup and click errors are skipped.
pub async fn click_first<F: Fetcher + ?Sized>(fetcher: &F, selectors: &[String]) -> Option<String> {
    for selector in selectors {
        let Ok(found) = fetcher.find(selector).await else {
            continue;
        };
        for element in &found {
            if fetcher.click(element).await.is_ok() {
                tracing::debug!("Clicked '{}'", selector);
                return Some(selector.clone());
            }
        }
    }
    None
}
