use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of leading text characters that take part in the dedup key.
pub const DEDUP_TEXT_PREFIX: usize = 50;

/// One review as seen at extraction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub author: Option<String>,
    pub rating: Option<f64>,
    pub text: Option<String>,
    /// Free-form date as displayed, e.g. "3 weeks ago".
    pub date: Option<String>,
    pub date_estimated: Option<NaiveDate>,
    pub source_target: String,
    pub scraped_at: DateTime<Utc>,
}

impl Record {
    pub fn new(source_target: impl Into<String>) -> Self {
        Self {
            author: None,
            rating: None,
            text: None,
            date: None,
            date_estimated: None,
            source_target: source_target.into(),
            scraped_at: Utc::now(),
        }
    }

    /// True when no field was resolved at all.
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.rating.is_none() && self.text.is_none() && self.date.is_none()
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::derive(self.author.as_deref(), self.rating, self.text.as_deref())
    }

    pub fn display_author(&self) -> &str {
        self.author.as_deref().unwrap_or("unknown")
    }
}

/// Identity of a review across collector iterations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn derive(author: Option<&str>, rating: Option<f64>, text: Option<&str>) -> Self {
        let author = author.map(str::trim).unwrap_or("");
        let rating = rating.map(|r| format!("{:.1}", r)).unwrap_or_default();
        let prefix: String = text
            .map(str::trim)
            .unwrap_or("")
            .chars()
            .take(DEDUP_TEXT_PREFIX)
            .collect();

        let mut hasher = Sha256::new();
        hasher.update(author.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(rating.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(prefix.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
