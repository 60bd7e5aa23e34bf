//! One harvest run over every configured target.
//!
//! Targets are processed strictly one after another, each with its own
//! browser session:
//!
//! ```text
//! launch → navigate → consent → open reviews → collect → close → dispatch
//! ```
//!
//! A failing target is recorded in the [`RunSummary`] and the run moves on.

use chrono::{DateTime, Utc};
use tokio::io::BufReader;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::app::{GleanerError, Result};
use crate::collector::{Collection, IncrementalCollector, OperatorAdvancer, ScrollAdvancer, StopReason};
use crate::config::Config;
use crate::dispatch::{DispatchReport, Dispatcher, Sink};
use crate::domain::{Record, Target};
use crate::extractor::ItemExtractor;
use crate::fetcher::{click_first, ChromeSession, Fetcher};
use crate::schedule::Shutdown;

/// Outcome for one target.
#[derive(Debug)]
pub struct TargetReport {
    pub target: String,
    pub url: Option<String>,
    pub records: Vec<Record>,
    pub stop_reason: Option<StopReason>,
    pub dispatch: Option<DispatchReport>,
    pub error: Option<String>,
}

impl TargetReport {
    fn new(target: &Target) -> Self {
        Self {
            target: target.name.clone(),
            url: None,
            records: Vec::new(),
            stop_reason: None,
            dispatch: None,
            error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub targets: Vec<TargetReport>,
    /// Shutdown was requested before every target ran.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn total_records(&self) -> usize {
        self.targets.iter().map(|t| t.records.len()).sum()
    }

    pub fn failed_targets(&self) -> usize {
        self.targets.iter().filter(|t| t.is_failed()).count()
    }

    pub fn records_sent(&self) -> usize {
        self.targets
            .iter()
            .filter_map(|t| t.dispatch.as_ref())
            .map(|d| d.records_sent)
            .sum()
    }

    pub fn log(&self) {
        let elapsed = self.finished_at.signed_duration_since(self.started_at);
        info!(
            "Run complete: {} targets, {} records, {} sent, {} failed targets ({:.1}s)",
            self.targets.len(),
            self.total_records(),
            self.records_sent(),
            self.failed_targets(),
            elapsed.num_milliseconds() as f64 / 1000.0
        );
        for report in &self.targets {
            match &report.error {
                Some(e) => warn!("  {}: {} records, error: {}", report.target, report.records.len(), e),
                None => info!("  {}: {} records", report.target, report.records.len()),
            }
        }
    }
}

pub struct Harvester<S> {
    config: Config,
    dispatcher: Option<Dispatcher<S>>,
    manual: bool,
}

impl<S: Sink> Harvester<S> {
    /// `dispatcher = None` collects without sending anything.
    pub fn new(config: Config, dispatcher: Option<Dispatcher<S>>) -> Self {
        Self {
            config,
            dispatcher,
            manual: false,
        }
    }

    /// Let an operator scroll the visible browser instead of scrolling automatically.
    pub fn manual(mut self, manual: bool) -> Self {
        self.manual = manual;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run(&self, shutdown: &Shutdown) -> RunSummary {
        let started_at = Utc::now();
        let mut targets = Vec::with_capacity(self.config.targets.len());
        let mut interrupted = false;

        for (i, target) in self.config.targets.iter().enumerate() {
            if i > 0 {
                self.pause_between_targets(shutdown).await;
            }
            if shutdown.is_triggered() {
                warn!(
                    "Shutdown requested, skipping {} remaining target(s)",
                    self.config.targets.len() - i
                );
                interrupted = true;
                break;
            }

            info!("[{}/{}] {}", i + 1, self.config.targets.len(), target.name);
            targets.push(self.run_target(target).await);
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            targets,
            interrupted,
        };
        summary.log();
        summary
    }

    async fn pause_between_targets(&self, shutdown: &Shutdown) {
        let pause = self.config.collector.target_pause();
        if pause.is_zero() {
            return;
        }
        debug!("Waiting {:?} before the next target", pause);
        tokio::select! {
            _ = tokio::time::sleep(pause) => {},
            _ = shutdown.wait() => {},
        }
    }

    async fn run_target(&self, target: &Target) -> TargetReport {
        let collected = match target.resolve_urls(&self.config.view.search_url_template) {
            Ok(urls) => self.collect_in_browser(target, &urls).await,
            Err(e) => Err(e),
        };
        self.finish(target, collected).await
    }

    async fn collect_in_browser(&self, target: &Target, urls: &[Url]) -> Result<(Url, Collection)> {
        let session = ChromeSession::launch(&self.config.browser).await?;
        let result = self.harvest_target(&session, target, urls).await;
        session.close().await;
        result
    }

    /// Try the target's locator URLs in order until one yields reviews.
    ///
    /// When none does, the last empty collection is returned, or the last
    /// error if every locator failed outright.
    pub async fn harvest_target<F: Fetcher>(&self, fetcher: &F, target: &Target, urls: &[Url]) -> Result<(Url, Collection)> {
        let mut empty = None;
        let mut failure = None;

        for (i, url) in urls.iter().enumerate() {
            if i > 0 {
                info!("Trying locator {}/{} for {}", i + 1, urls.len(), target.name);
            }
            match self.harvest_with(fetcher, target, url).await {
                Ok(collection) if !collection.records.is_empty() => return Ok((url.clone(), collection)),
                Ok(collection) => {
                    warn!("No reviews for {} at {}", target.name, url);
                    empty = Some((url.clone(), collection));
                }
                Err(e) => {
                    warn!("{} failed at {}: {}", target.name, url, e);
                    failure = Some(e);
                }
            }
        }

        match (empty, failure) {
            (Some(collected), _) => Ok(collected),
            (None, Some(e)) => Err(e),
            (None, None) => Err(GleanerError::Config(format!("target '{}' has no locators", target.name))),
        }
    }

    /// Drive one locator URL on an already launched fetcher.
    pub async fn harvest_with<F: Fetcher>(&self, fetcher: &F, target: &Target, url: &Url) -> Result<Collection> {
        info!("Opening {}", url);
        fetcher.navigate(url.as_str()).await?;
        self.accept_consent(fetcher).await;

        if !self.items_visible(fetcher).await && !self.open_reviews(fetcher).await {
            // Search result pages link to the place page instead of showing reviews
            match click_first(fetcher, &self.config.view.place_link_selectors).await {
                Some(selector) => {
                    info!("Followed place link via '{}'", selector);
                    tokio::time::sleep(self.config.collector.settle_delay()).await;
                    self.accept_consent(fetcher).await;
                    if !self.items_visible(fetcher).await && !self.open_reviews(fetcher).await {
                        warn!("No reviews control found for {} after following the place link", target.name);
                    }
                }
                None => warn!("No reviews control found for {}, collecting from the page as is", target.name),
            }
        }

        let collector = IncrementalCollector::new(
            self.config.collector.clone(),
            self.config.view.item_selectors.clone(),
            ItemExtractor::new(self.config.strategies.clone()),
        );

        let collection = if self.manual {
            let mut advancer =
                OperatorAdvancer::new(BufReader::new(tokio::io::stdin()), self.config.collector.settle_delay());
            collector.collect(fetcher, &mut advancer, &target.name).await
        } else {
            let mut advancer = ScrollAdvancer::new(
                self.config.view.scroll_container.clone(),
                self.config.collector.settle_delay(),
            )
            .with_expand_selectors(self.config.view.expand_selectors.clone())
            .with_jitter(self.config.collector.settle_jitter());
            collector.collect(fetcher, &mut advancer, &target.name).await
        };

        Ok(collection)
    }

    async fn accept_consent<F: Fetcher>(&self, fetcher: &F) {
        if let Some(selector) = click_first(fetcher, &self.config.view.consent_selectors).await {
            info!("Accepted consent banner via '{}'", selector);
            tokio::time::sleep(self.config.collector.settle_delay()).await;
        }
    }

    async fn open_reviews<F: Fetcher>(&self, fetcher: &F) -> bool {
        match click_first(fetcher, &self.config.view.open_reviews_selectors).await {
            Some(selector) => {
                info!("Opened reviews via '{}'", selector);
                tokio::time::sleep(self.config.collector.settle_delay()).await;
                true
            }
            None => false,
        }
    }

    async fn items_visible<F: Fetcher>(&self, fetcher: &F) -> bool {
        for selector in &self.config.view.item_selectors {
            if let Ok(found) = fetcher.find(selector).await {
                if !found.is_empty() {
                    return true;
                }
            }
        }
        false
    }

    /// Turn a collection outcome into a report, dispatching what was collected.
    pub async fn finish(&self, target: &Target, collected: Result<(Url, Collection)>) -> TargetReport {
        let mut report = TargetReport::new(target);

        let (url, collection) = match collected {
            Ok(c) => c,
            Err(e) => {
                error!("{} failed: {}", target.name, e);
                report.error = Some(e.to_string());
                return report;
            }
        };

        report.url = Some(url.to_string());
        report.stop_reason = Some(collection.stop_reason);
        report.records = collection.records;

        if report.records.is_empty() {
            warn!("No reviews collected for {}", target.name);
            report.error = Some("no reviews collected".to_string());
            return report;
        }

        if let Some(dispatcher) = &self.dispatcher {
            let dispatched = dispatcher.dispatch(&report.records).await;
            if dispatched.all_failed() {
                let e = GleanerError::Other(format!("all {} batch(es) failed to dispatch", dispatched.batches));
                error!("{}: {}", target.name, e);
                report.error = Some(e.to_string());
            }
            report.dispatch = Some(dispatched);
        }

        report
    }
}
