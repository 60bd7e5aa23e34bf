//! Turning one review element into a [`Record`].
//!
//! Each field has an ordered list of [`FieldStrategy`] values and the first one
//! that yields a non-blank value wins. Fields no strategy resolves stay `None`.
//! Extraction never fails: an element that resolves no field at all is simply
//! reported as "no data".

mod rating;
mod strategy;

pub use rating::{parse_rating, MAX_RATING};
pub use strategy::{FieldStrategy, StrategySet};

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use crate::domain::{estimate_date, Record};
use crate::fetcher::ElementHandle;

/// Optional quality gate applied to every extracted record.
pub type Validator = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct ItemExtractor {
    strategies: StrategySet,
    validator: Option<Validator>,
}

impl fmt::Debug for ItemExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemExtractor")
            .field("strategies", &self.strategies)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl ItemExtractor {
    pub fn new(strategies: StrategySet) -> Self {
        Self {
            strategies,
            validator: None,
        }
    }

    /// Reject records for which `validator` returns false.
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn strategies(&self) -> &StrategySet {
        &self.strategies
    }

    pub async fn extract<E: ElementHandle + ?Sized>(&self, element: &E, source_target: &str) -> Option<Record> {
        let mut record = Record::new(source_target);
        record.author = first_match(element, &self.strategies.author).await;
        record.rating = self.rating(element).await;
        record.text = first_match(element, &self.strategies.text).await;
        record.date = first_match(element, &self.strategies.date).await;

        if record.is_empty() {
            return None;
        }

        record.date_estimated = record
            .date
            .as_deref()
            .and_then(|d| estimate_date(d, Utc::now().date_naive()));

        if let Some(validator) = &self.validator {
            if !validator(&record) {
                tracing::trace!("Record by {} rejected by validator", record.display_author());
                return None;
            }
        }

        Some(record)
    }

    async fn rating<E: ElementHandle + ?Sized>(&self, element: &E) -> Option<f64> {
        for strategy in &self.strategies.rating {
            if let Some(rating) = strategy.apply(element).await.as_deref().and_then(parse_rating) {
                return Some(rating);
            }
        }
        None
    }
}

async fn first_match<E: ElementHandle + ?Sized>(element: &E, strategies: &[FieldStrategy]) -> Option<String> {
    for strategy in strategies {
        if let Some(value) = strategy.apply(element).await {
            return Some(value);
        }
    }
    None
}
