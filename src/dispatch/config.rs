use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding `sink.endpoint`.
pub const WEBHOOK_URL_ENV: &str = "GLEANER_WEBHOOK_URL";

/// Body encoding of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// One JSON array per batch
    #[default]
    JsonArray,
    /// One JSON object per line
    Ndjson,
}

/// Delivery settings for the webhook sink
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Webhook URL. Prefer setting GLEANER_WEBHOOK_URL over storing it here.
    pub endpoint: Option<String>,

    /// Payload encoding (default: json_array)
    pub format: PayloadFormat,

    /// Records per request (default: 100)
    pub batch_size: usize,

    /// Attempts per batch, including the first one (default: 3)
    pub retry_limit: u32,

    /// Wait before the second attempt; doubles for every further attempt (default: 1000)
    pub backoff_base_ms: u64,

    /// Upper bound on the wait between attempts (default: 30000)
    pub backoff_max_ms: u64,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Pause between two batches in milliseconds (default: 500)
    pub inter_batch_delay_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            format: PayloadFormat::JsonArray,
            batch_size: 100,
            retry_limit: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 30_000,
            timeout_secs: 30,
            inter_batch_delay_ms: 500,
        }
    }
}

impl SinkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }

    /// Wait after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let millis = self.backoff_base_ms.saturating_mul(factor);
        Duration::from_millis(millis.min(self.backoff_max_ms))
    }
}
