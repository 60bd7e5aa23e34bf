use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::{GleanerError, Result};
use crate::fetcher::config::BrowserSettings;
use crate::fetcher::{ElementHandle, Fetcher};

/// A Chrome process with a single page, driven through chromiumoxide.
///
/// The session is a scoped resource: call [`ChromeSession::close`] on every
/// exit path. If it is dropped without closing, the handler task is aborted
/// and chromiumoxide kills the child process.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    settings: BrowserSettings,
}

impl ChromeSession {
    /// Launch a new browser process with the given settings
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let (width, height) = settings.window_size;
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--lang={}", settings.language))
            .window_size(width, height)
            .request_timeout(settings.timeout());

        for arg in &settings.extra_args {
            builder = builder.arg(arg.as_str());
        }

        if !settings.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| GleanerError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            GleanerError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut session_browser = browser;
                let _ = session_browser.close().await;
                handler.abort();
                return Err(GleanerError::Browser(format!("Failed to create page: {}", e)));
            }
        };

        let session = Self {
            browser,
            page,
            handler,
            settings: settings.clone(),
        };

        if let Some(ref ua) = settings.user_agent {
            if let Err(e) = session.page.set_user_agent(ua).await {
                session.close().await;
                return Err(GleanerError::Browser(format!("Failed to set user agent: {}", e)));
            }
        }

        Ok(session)
    }

    /// Close the page and the browser process and wait for it to exit.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
    }

    fn scroll_script(container: Option<&str>) -> String {
        let selector = container
            .and_then(|c| serde_json::to_string(c).ok())
            .unwrap_or_else(|| "null".to_string());
        format!(
            r#"
            (() => {{
                const selector = {selector};
                const container = selector ? document.querySelector(selector) : null;
                if (container) {{
                    container.scrollTop = container.scrollHeight;
                    return 'container';
                }}
                window.scrollBy(0, 1000);
                return 'window';
            }})()
            "#
        )
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn browser_err(context: &str, e: impl std::fmt::Display) -> GleanerError {
    GleanerError::Browser(format!("{}: {}", context, e))
}

#[async_trait]
impl Fetcher for ChromeSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| browser_err("Navigation failed", e))?;

        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| browser_err("Navigation failed", e))?;

        // Additional wait for dynamic content
        tokio::time::sleep(self.settings.wait_after_load()).await;
        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<Vec<Element>> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| browser_err("Element query failed", e))
    }

    async fn scroll(&self, container: Option<&str>) -> Result<()> {
        let target: String = self
            .page
            .evaluate(Self::scroll_script(container))
            .await
            .map_err(|e| browser_err("Scroll script failed", e))?
            .into_value()
            .map_err(|e| browser_err("Failed to parse scroll result", format!("{:?}", e)))?;
        debug!("Scrolled {}", target);
        Ok(())
    }

    async fn click(&self, element: &Element) -> Result<()> {
        element
            .click()
            .await
            .map_err(|e| browser_err("Click failed", e))?;
        Ok(())
    }
}

#[async_trait]
impl ElementHandle for Element {
    async fn text(&self) -> Result<Option<String>> {
        self.inner_text()
            .await
            .map_err(|e| browser_err("Failed to read text", e))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Element::attribute(self, name)
            .await
            .map_err(|e| browser_err("Failed to read attribute", e))
    }

    async fn child_text(&self, selector: &str) -> Result<Option<String>> {
        match self.find_element(selector).await {
            Ok(child) => child
                .inner_text()
                .await
                .map_err(|e| browser_err("Failed to read text", e)),
            Err(_) => Ok(None),
        }
    }

    async fn child_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        match self.find_element(selector).await {
            Ok(child) => Element::attribute(&child, name)
                .await
                .map_err(|e| browser_err("Failed to read attribute", e)),
            Err(_) => Ok(None),
        }
    }
}
