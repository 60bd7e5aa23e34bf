use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the browser session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Page load timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Wait time after navigation for dynamic content in milliseconds (default: 5000)
    pub wait_after_load_ms: u64,

    /// Browser window size as (width, height)
    pub window_size: (u32, u32),

    /// Browser UI language passed as `--lang`
    pub language: String,

    /// User agent string to use
    pub user_agent: Option<String>,

    /// Extra command line flags for the browser process
    pub extra_args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_secs: 30,
            wait_after_load_ms: 5000,
            window_size: (1920, 1080),
            language: "en-US".to_string(),
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            extra_args: vec!["--disable-blink-features=AutomationControlled".to_string()],
        }
    }
}

impl BrowserSettings {
    /// Get the page load timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the wait time after load as a Duration
    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }
}
