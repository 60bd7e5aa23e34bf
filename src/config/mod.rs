//! Configuration management for Gleaner.
//!
//! Configuration is read from `~/.config/gleaner/config.toml` (or `--config`).
//! If the default file doesn't exist, a configuration with comments is created.
//! The sink endpoint is a secret and should come from `GLEANER_WEBHOOK_URL`,
//! which overrides `sink.endpoint`.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app::GleanerError;
use crate::collector::{CollectorConfig, ViewConfig};
use crate::dispatch::{SinkConfig, WEBHOOK_URL_ENV};
use crate::domain::{Target, QUERY_PLACEHOLDER};
use crate::extractor::StrategySet;
use crate::fetcher::BrowserSettings;
use crate::schedule::ScheduleConfig;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sink: SinkConfig,
    pub collector: CollectorConfig,
    pub browser: BrowserSettings,
    pub view: ViewConfig,
    pub strategies: StrategySet,
    pub schedule: ScheduleConfig,
    pub targets: Vec<Target>,
}

impl Config {
    /// Load configuration from `path`, or from the default path.
    ///
    /// A missing default file is created with comments. A missing explicit
    /// file is an error. Missing fields use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    tracing::info!("Created default config at {}", default_path.display());
                }
                default_path
            }
        };

        let mut config = Self::from_file(&config_path)?;
        config.apply_env(std::env::var(WEBHOOK_URL_ENV).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/gleaner/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("gleaner").join("config.toml"))
    }

    /// A non-empty webhook URL from the environment replaces `sink.endpoint`.
    pub fn apply_env(&mut self, webhook_url: Option<String>) {
        if let Some(url) = webhook_url.filter(|u| !u.trim().is_empty()) {
            self.sink.endpoint = Some(url.trim().to_string());
        }
    }

    /// Check everything that would otherwise fail halfway through a run.
    pub fn validate(&self, dispatch_enabled: bool) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::Invalid(
                "no targets configured, add at least one [[targets]] entry".into(),
            ));
        }
        for target in &self.targets {
            if target.name.trim().is_empty() || target.locator.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "every target needs a non-empty name and locator".into(),
                ));
            }
        }

        if dispatch_enabled {
            let endpoint = self.sink.endpoint.as_deref().ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "no sink endpoint, set {} or sink.endpoint",
                    WEBHOOK_URL_ENV
                ))
            })?;
            url::Url::parse(endpoint)
                .map_err(|e| ConfigError::Invalid(format!("invalid sink endpoint: {}", e)))?;
        }

        if self.sink.batch_size == 0 {
            return Err(ConfigError::Invalid("sink.batch_size must be at least 1".into()));
        }
        if self.sink.retry_limit == 0 {
            return Err(ConfigError::Invalid("sink.retry_limit must be at least 1".into()));
        }
        if self.collector.stagnation_limit == 0 {
            return Err(ConfigError::Invalid(
                "collector.stagnation_limit must be at least 1".into(),
            ));
        }
        if self.collector.stagnation_limit < 3 {
            tracing::warn!(
                "collector.stagnation_limit = {} may stop before slow pages finish loading",
                self.collector.stagnation_limit
            );
        }
        if self.view.item_selectors.is_empty() {
            return Err(ConfigError::Invalid("view.item_selectors must not be empty".into()));
        }
        if !self.view.search_url_template.contains(QUERY_PLACEHOLDER) {
            return Err(ConfigError::Invalid(format!(
                "view.search_url_template must contain {}",
                QUERY_PLACEHOLDER
            )));
        }
        self.schedule.interval().map_err(ConfigError::Invalid)?;

        Ok(())
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# Gleaner Configuration
#
# The webhook URL is a secret. Set it through the environment:
#   export GLEANER_WEBHOOK_URL="https://hooks.example.com/..."
# It overrides sink.endpoint below.
#
# Targets are either a full URL or a search query that is rendered into
# view.search_url_template:
#
# [[targets]]
# name = "The Waters at Hammond"
# locator = "The Waters at Hammond"
#
# [[targets]]
# name = "Riverside Lofts"
# locator = "https://www.google.com/maps/place/..."
# # Tried in order when the locator above yields no reviews
# fallbacks = ["Riverside Lofts Apartments Austin TX"]

[sink]
# Payload encoding: "json_array" or "ndjson"
format = "json_array"

# Records per request
batch_size = 100

# Attempts per batch, including the first
retry_limit = 3

# Backoff between attempts doubles from base up to max (milliseconds)
backoff_base_ms = 1000
backoff_max_ms = 30000

# Request timeout in seconds
timeout_secs = 30

# Pause between batches (milliseconds)
inter_batch_delay_ms = 500

[collector]
# Hard ceiling on scroll iterations per target
max_attempts = 30

# Stop after this many iterations in a row without a new review
stagnation_limit = 3

# Wait after each scroll for new reviews to render (milliseconds)
settle_delay_ms = 1000

# Random extra wait added to the settle delay (milliseconds)
settle_jitter_ms = 250

# Optional cap on reviews per target
# max_records = 500

# Pause between two targets, plus a random extra wait (milliseconds)
target_delay_ms = 3000
target_jitter_ms = 2000

[browser]
# Run browser in headless mode (no visible window)
headless = true

# Page load timeout in seconds
timeout_secs = 30

# Wait time after page load for dynamic content (milliseconds)
wait_after_load_ms = 5000

window_size = [1920, 1080]
language = "en-US"

[schedule]
# Time between runs in loop mode: "30m", "6h", "7d" or raw seconds
interval = "7d"

# Run immediately when the loop starts
run_on_start = true

# [view] and [strategies] describe the review page markup. The built-in
# defaults target Google Maps. Override them only if the markup changed:
#
# [view]
# item_selectors = [".jftiEf", "[data-review-id]"]
# scroll_container = "div.m6QErb.DxyBCb"
# expand_selectors = ["button.w8nwRe"]
# # Followed from a search results page when no review list is shown
# place_link_selectors = ['a[href*="google.com/maps/place"]']
#
# [strategies]
# author = [{ kind = "text", selector = ".d4r55" }]
# rating = [{ kind = "attribute", selector = ".kvMYJc", name = "aria-label" }]
# text = [{ kind = "text", selector = ".wiI7pd" }]
# date = [{ kind = "text", selector = ".rsqaWe" }]
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for GleanerError {
    fn from(e: ConfigError) -> Self {
        GleanerError::Config(e.to_string())
    }
}
