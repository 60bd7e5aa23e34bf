//! # Gleaner
//!
//! Incremental review collection from dynamically loaded pages.
//!
//! ## Architecture
//!
//! Gleaner follows a sequential pipeline, one target at a time:
//!
//! ```text
//! Fetcher → Collector (Extractor + dedup) → Dispatcher → Webhook
//! ```
//!
//! - [`fetcher`]: Browser capabilities backed by headless Chrome
//! - [`collector`]: Scroll-and-collect loop with stagnation detection
//! - [`extractor`]: Per-field selector strategies turning elements into records
//! - [`dispatch`]: Batched webhook delivery with retry and backoff
//!
//! ## Quick Start
//!
//! ```bash
//! # Point at the sink
//! export GLEANER_WEBHOOK_URL="https://hooks.example.com/..."
//!
//! # Check the sink accepts records
//! gleaner ping
//!
//! # Harvest all targets once
//! gleaner run --once
//!
//! # Harvest every 7 days (default interval)
//! gleaner run
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cli`]: Command-line interface definitions
//! - [`domain`]: Core domain models (Target, Record, dedup keys)
//! - [`harvest`]: Per-target pipeline and run summaries
//! - [`schedule`]: Recurring runs and shutdown handling
//! - [`export`]: JSON snapshots of a run

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct holds the loaded configuration
/// and wires the sink and harvester from it.
pub mod app;

/// Configuration management.
///
/// Loads from `~/.config/gleaner/config.toml`, supporting:
/// - Sink delivery settings (endpoint via `GLEANER_WEBHOOK_URL`)
/// - Collector termination tunables
/// - Review page selectors and extraction strategies
/// - Targets
pub mod config;

/// Command-line interface using clap.
///
/// - `run [--once]` - Harvest all targets, once or on an interval
/// - `targets` - List targets and their resolved URLs
/// - `ping` - Send a test record to the sink
pub mod cli;

/// Incremental collection loop.
///
/// - [`IncrementalCollector`](collector::IncrementalCollector): query, extract, dedup, advance
/// - [`Advancer`](collector::Advancer): scrolling or operator-driven advance step
pub mod collector;

/// Webhook delivery.
///
/// - [`Dispatcher`](dispatch::Dispatcher): batching, retry and backoff
/// - [`WebhookSink`](dispatch::WebhookSink): reqwest-based implementation
pub mod dispatch;

/// Core domain models.
///
/// - [`Target`](domain::Target): a named location and its locator
/// - [`Record`](domain::Record): one review with SHA256 dedup key
pub mod domain;

/// JSON snapshot files of a run.
pub mod export;

/// Element-to-record extraction with first-match-wins strategies.
pub mod extractor;

/// Browser capabilities.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait the collector drives
/// - [`ChromeSession`](fetcher::ChromeSession): chromiumoxide-based implementation
pub mod fetcher;

/// Per-target harvest pipeline.
pub mod harvest;

/// Interval scheduling and graceful shutdown.
pub mod schedule;
