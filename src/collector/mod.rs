//! Incremental collection of reviews from a progressively loading list.
//!
//! The view never signals "end of list" reliably, so the loop is bounded on
//! two sides:
//!
//! - `max_attempts` is a hard ceiling on iterations, which protects against
//!   infinite scroll and stale selectors that keep returning the same nodes.
//! - `stagnation_limit` ends collection early once that many consecutive
//!   iterations produced no new unique record.
//!
//! ```text
//! query visible items → extract → dedup → stagnated? → advance → query …
//! ```
//!
//! A failed query counts as an iteration without new records; records already
//! collected are never discarded.

mod advance;
mod config;

pub use advance::{Advancer, OperatorAdvancer, ScrollAdvancer};
pub use config::{CollectorConfig, ViewConfig};

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::app::Result;
use crate::domain::{DedupKey, Record};
use crate::extractor::ItemExtractor;
use crate::fetcher::Fetcher;

/// Why a collection pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stagnation_limit` consecutive iterations added nothing.
    Stagnated,
    /// `max_attempts` iterations ran.
    AttemptsExhausted,
    /// `max_records` records were collected.
    RecordLimit,
}

/// Per-target state of one collection pass.
#[derive(Debug, Default)]
pub struct CollectionState {
    pub seen_keys: HashSet<DedupKey>,
    pub records: Vec<Record>,
    pub consecutive_no_growth_count: usize,
    pub total_scroll_attempts: usize,
}

impl CollectionState {
    /// Keep `record` if its dedup key is new. Returns whether it was kept.
    pub fn offer(&mut self, record: Record) -> bool {
        if self.seen_keys.insert(record.dedup_key()) {
            self.records.push(record);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result of one collection pass.
#[derive(Debug)]
pub struct Collection {
    /// Unique records in first-seen order.
    pub records: Vec<Record>,
    /// Number of item queries issued.
    pub iterations: usize,
    /// Number of advance steps taken.
    pub advances: usize,
    pub stop_reason: StopReason,
}

pub struct IncrementalCollector {
    config: CollectorConfig,
    item_selectors: Vec<String>,
    extractor: ItemExtractor,
}

impl IncrementalCollector {
    pub fn new(config: CollectorConfig, item_selectors: Vec<String>, extractor: ItemExtractor) -> Self {
        Self {
            config,
            item_selectors,
            extractor,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub async fn collect<F, A>(&self, fetcher: &F, advancer: &mut A, target: &str) -> Collection
    where
        F: Fetcher + ?Sized,
        A: Advancer + ?Sized,
    {
        let mut state = CollectionState::default();
        let mut iterations = 0;
        let mut stop_reason = StopReason::AttemptsExhausted;

        while state.total_scroll_attempts < self.config.max_attempts {
            if self.limit_reached(&state) {
                stop_reason = StopReason::RecordLimit;
                break;
            }

            iterations += 1;
            let elements = match self.visible_items(fetcher).await {
                Ok(elements) => elements,
                Err(e) => {
                    warn!("Item query failed for {}: {}", target, e);
                    Vec::new()
                }
            };

            let mut added = 0;
            for element in &elements {
                if self.limit_reached(&state) {
                    break;
                }
                if let Some(record) = self.extractor.extract(element, target).await {
                    if state.offer(record) {
                        added += 1;
                    }
                }
            }

            if added == 0 {
                state.consecutive_no_growth_count += 1;
            } else {
                state.consecutive_no_growth_count = 0;
            }

            debug!(
                "{}: iteration {} saw {} elements, +{} new, {} total, stagnation {}/{}",
                target,
                iterations,
                elements.len(),
                added,
                state.len(),
                state.consecutive_no_growth_count,
                self.config.stagnation_limit
            );

            if state.consecutive_no_growth_count >= self.config.stagnation_limit {
                stop_reason = StopReason::Stagnated;
                break;
            }

            if self.limit_reached(&state) {
                stop_reason = StopReason::RecordLimit;
                break;
            }

            if let Err(e) = advancer.advance(fetcher).await {
                warn!("Advance failed for {}: {}", target, e);
            }
            state.total_scroll_attempts += 1;
        }

        info!(
            "{}: collected {} records in {} iterations ({:?})",
            target,
            state.len(),
            iterations,
            stop_reason
        );

        Collection {
            records: state.records,
            iterations,
            advances: state.total_scroll_attempts,
            stop_reason,
        }
    }

    fn limit_reached(&self, state: &CollectionState) -> bool {
        self.config
            .max_records
            .is_some_and(|limit| state.len() >= limit)
    }

    /// Query every item selector and keep the one matching the most elements.
    ///
    /// Fails only if every selector failed.
    async fn visible_items<F: Fetcher + ?Sized>(&self, fetcher: &F) -> Result<Vec<F::Element>> {
        let mut best: Option<Vec<F::Element>> = None;
        let mut last_error = None;

        for selector in &self.item_selectors {
            match fetcher.find(selector).await {
                Ok(found) => {
                    if best.as_ref().is_none_or(|b| found.len() > b.len()) {
                        best = Some(found);
                    }
                }
                Err(e) => last_error = Some(e),
            }
        }

        match (best, last_error) {
            (Some(found), _) => Ok(found),
            (None, Some(e)) => Err(e),
            (None, None) => Ok(Vec::new()),
        }
    }
}
