use serde::{Deserialize, Serialize};

use crate::fetcher::ElementHandle;

/// One way of reading a field off a review element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldStrategy {
    /// Text of the first descendant matching `selector`.
    Text { selector: String },
    /// Attribute `name` of the first descendant matching `selector`.
    Attribute { selector: String, name: String },
    /// Text of the review element itself.
    OwnText,
    /// Attribute `name` of the review element itself.
    OwnAttribute { name: String },
}

impl FieldStrategy {
    pub fn text(selector: &str) -> Self {
        Self::Text {
            selector: selector.to_string(),
        }
    }

    pub fn attribute(selector: &str, name: &str) -> Self {
        Self::Attribute {
            selector: selector.to_string(),
            name: name.to_string(),
        }
    }

    /// Apply the strategy. Errors and blank values both read as `None`.
    pub async fn apply<E: ElementHandle + ?Sized>(&self, element: &E) -> Option<String> {
        let value = match self {
            Self::Text { selector } => element.child_text(selector).await,
            Self::Attribute { selector, name } => element.child_attribute(selector, name).await,
            Self::OwnText => element.text().await,
            Self::OwnAttribute { name } => element.attribute(name).await,
        };

        match value {
            Ok(Some(v)) => {
                let trimmed = v.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Ok(None) => None,
            Err(e) => {
                tracing::trace!("Strategy {:?} failed: {}", self, e);
                None
            }
        }
    }
}

/// Ordered strategy lists, one per field. First match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySet {
    pub author: Vec<FieldStrategy>,
    pub rating: Vec<FieldStrategy>,
    pub text: Vec<FieldStrategy>,
    pub date: Vec<FieldStrategy>,
}

impl Default for StrategySet {
    fn default() -> Self {
        Self {
            author: vec![
                FieldStrategy::text(".d4r55"),
                FieldStrategy::text(".IaK8zc"),
                FieldStrategy::text(".CVo7Bb"),
                FieldStrategy::text(".P5Bobd"),
                FieldStrategy::text(".reviewer-name"),
            ],
            rating: vec![
                FieldStrategy::attribute(".kvMYJc", "aria-label"),
                FieldStrategy::attribute("[aria-label*=\"star\"]", "aria-label"),
                FieldStrategy::attribute(".HeTgld", "aria-label"),
                FieldStrategy::text(".fzvQIb"),
                FieldStrategy::text(".lNH4rd"),
            ],
            text: vec![
                FieldStrategy::text(".wiI7pd"),
                FieldStrategy::text(".MyEned"),
                FieldStrategy::text(".umkQCd"),
                FieldStrategy::text(".Inlyae"),
                FieldStrategy::text(".review-full-text"),
                FieldStrategy::text(".review-snippet"),
            ],
            date: vec![
                FieldStrategy::text(".rsqaWe"),
                FieldStrategy::text(".xRkPPb"),
                FieldStrategy::text(".bHyEBc"),
                FieldStrategy::text(".review-date"),
            ],
        }
    }
}
