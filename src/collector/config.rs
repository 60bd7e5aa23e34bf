use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Termination and pacing of the collection loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Hard ceiling on collection iterations (default: 30)
    pub max_attempts: usize,

    /// Consecutive iterations without a new record before the view counts as exhausted (default: 3)
    pub stagnation_limit: usize,

    /// Wait after each scroll for new content to render, in milliseconds (default: 1000)
    pub settle_delay_ms: u64,

    /// Random extra wait added to the settle delay, in milliseconds (default: 250)
    pub settle_jitter_ms: u64,

    /// Stop once this many records were collected for a target (default: unlimited)
    pub max_records: Option<usize>,

    /// Pause between two targets in milliseconds (default: 3000)
    pub target_delay_ms: u64,

    /// Random extra pause added between targets, in milliseconds (default: 2000)
    pub target_jitter_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            stagnation_limit: 3,
            settle_delay_ms: 1000,
            settle_jitter_ms: 250,
            max_records: None,
            target_delay_ms: 3000,
            target_jitter_ms: 2000,
        }
    }
}

impl CollectorConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn settle_jitter(&self) -> Duration {
        Duration::from_millis(self.settle_jitter_ms)
    }

    /// Pause before the next target: the base delay plus a random share of the jitter.
    pub fn target_pause(&self) -> Duration {
        let jitter = match self.target_jitter_ms {
            0 => 0,
            max => rand::thread_rng().gen_range(0..=max),
        };
        Duration::from_millis(self.target_delay_ms.saturating_add(jitter))
    }
}

/// Selectors describing the review view of the target UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// URL template for targets given as a search query; `{query}` is replaced
    pub search_url_template: String,

    /// Consent banner buttons, tried in order
    pub consent_selectors: Vec<String>,

    /// Controls that open the reviews panel, tried in order
    pub open_reviews_selectors: Vec<String>,

    /// Links from a search results page to the place page, followed when no
    /// reviews control is found
    pub place_link_selectors: Vec<String>,

    /// Review item containers; the selector matching the most elements wins
    pub item_selectors: Vec<String>,

    /// Scrollable container of the review list
    pub scroll_container: Option<String>,

    /// "More" buttons expanding truncated review text
    pub expand_selectors: Vec<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            search_url_template: "https://www.google.com/maps/search/{query}".to_string(),
            consent_selectors: vec![
                "button[aria-label*=\"Accept all\"]".to_string(),
                "form[action*=\"consent\"] button".to_string(),
            ],
            open_reviews_selectors: vec![
                "button[aria-label*=\" reviews\"]".to_string(),
                "button[role=\"tab\"][aria-label*=\"Reviews\"]".to_string(),
                "[jsaction*=\"reviewChart\"]".to_string(),
            ],
            place_link_selectors: vec![
                "a[href*=\"google.com/maps/place\"]".to_string(),
                "a[href*=\"maps.google.com\"]".to_string(),
                "a[href*=\"google.com/maps\"]".to_string(),
            ],
            item_selectors: vec![
                ".jftiEf".to_string(),
                "[data-review-id]".to_string(),
                ".hjmQqc".to_string(),
                ".g88MCb".to_string(),
            ],
            scroll_container: Some("div.m6QErb.DxyBCb".to_string()),
            expand_selectors: vec!["button.w8nwRe".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_collector_config() {
        let config = CollectorConfig::default();
        assert_eq!(config.max_attempts, 30);
        assert_eq!(config.stagnation_limit, 3);
        assert_eq!(config.settle_delay(), Duration::from_millis(1000));
        assert_eq!(config.settle_jitter(), Duration::from_millis(250));
        assert_eq!(config.max_records, None);
        assert_eq!(config.target_delay_ms, 3000);
    }

    #[test]
    fn test_target_pause_within_jitter() {
        let config = CollectorConfig {
            target_delay_ms: 100,
            target_jitter_ms: 50,
            ..Default::default()
        };
        for _ in 0..20 {
            let pause = config.target_pause();
            assert!(pause >= Duration::from_millis(100));
            assert!(pause <= Duration::from_millis(150));
        }

        let none = CollectorConfig {
            target_delay_ms: 0,
            target_jitter_ms: 0,
            ..Default::default()
        };
        assert!(none.target_pause().is_zero());
    }

    #[test]
    fn test_default_view_has_query_placeholder() {
        let view = ViewConfig::default();
        assert!(view.search_url_template.contains("{query}"));
        assert!(!view.item_selectors.is_empty());
    }
}
