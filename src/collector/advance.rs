use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::app::{GleanerError, Result};
use crate::fetcher::Fetcher;

/// The step between two collector iterations that reveals more content.
#[async_trait]
pub trait Advancer: Send {
    async fn advance<F: Fetcher + ?Sized>(&mut self, fetcher: &F) -> Result<()>;
}

/// Scrolls the review list, expands truncated reviews and waits for rendering.
#[derive(Debug, Clone)]
pub struct ScrollAdvancer {
    scroll_container: Option<String>,
    expand_selectors: Vec<String>,
    settle_delay: Duration,
    settle_jitter: Duration,
}

impl ScrollAdvancer {
    pub fn new(scroll_container: Option<String>, settle_delay: Duration) -> Self {
        Self {
            scroll_container,
            expand_selectors: Vec::new(),
            settle_delay,
            settle_jitter: Duration::ZERO,
        }
    }

    pub fn with_expand_selectors(mut self, selectors: Vec<String>) -> Self {
        self.expand_selectors = selectors;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.settle_jitter = jitter;
        self
    }

    fn settle_time(&self) -> Duration {
        let jitter_ms = self.settle_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.settle_delay;
        }
        self.settle_delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }

    /// Click every visible "More" button. Returns how many were expanded.
    pub async fn expand<F: Fetcher + ?Sized>(&self, fetcher: &F) -> usize {
        let mut expanded = 0;
        for selector in &self.expand_selectors {
            let Ok(buttons) = fetcher.find(selector).await else {
                continue;
            };
            for button in &buttons {
                if fetcher.click(button).await.is_ok() {
                    expanded += 1;
                }
            }
        }
        expanded
    }
}

#[async_trait]
impl Advancer for ScrollAdvancer {
    async fn advance<F: Fetcher + ?Sized>(&mut self, fetcher: &F) -> Result<()> {
        fetcher.scroll(self.scroll_container.as_deref()).await?;

        let expanded = self.expand(fetcher).await;
        if expanded > 0 {
            debug!("Expanded {} truncated reviews", expanded);
        }

        let settle = self.settle_time();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        Ok(())
    }
}

/// Waits for a human operator to scroll the visible browser and press Enter.
pub struct OperatorAdvancer<R> {
    input: R,
    settle_delay: Duration,
    rounds: usize,
}

impl<R: AsyncBufRead + Unpin + Send> OperatorAdvancer<R> {
    pub fn new(input: R, settle_delay: Duration) -> Self {
        Self {
            input,
            settle_delay,
            rounds: 0,
        }
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Advancer for OperatorAdvancer<R> {
    async fn advance<F: Fetcher + ?Sized>(&mut self, _fetcher: &F) -> Result<()> {
        self.rounds += 1;
        eprintln!(
            "Scroll the reviews panel to load more, then press Enter (round {})",
            self.rounds
        );

        let mut line = String::new();
        let read = self.input.read_line(&mut line).await?;
        if read == 0 {
            return Err(GleanerError::Other("operator input closed".into()));
        }
        info!("Operator confirmed round {}", self.rounds);

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(())
    }
}
