//! Delivery of collected records to the webhook sink.
//!
//! Records are flattened, split into batches and sent in order. Each batch
//! gets up to `retry_limit` attempts with exponential backoff between them.
//! A batch that exhausts its attempts is reported and the next batch is sent
//! anyway. There is no remote de-duplication: a retried batch may arrive twice
//! if the sink accepted it but the response was lost.

mod config;
mod webhook;

pub use config::{PayloadFormat, SinkConfig, WEBHOOK_URL_ENV};
pub use webhook::{encode_batch, WebhookSink};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::{GleanerError, Result};
use crate::domain::Record;

/// Property name used for `gleaner ping` test records.
pub const PING_PROPERTY: &str = "gleaner-ping";

/// Wire shape of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRecord {
    pub property: String,
    pub author: Option<String>,
    pub rating: Option<String>,
    pub text: Option<String>,
    pub date: Option<String>,
    pub date_estimated: Option<NaiveDate>,
    pub scraped_at: DateTime<Utc>,
}

impl From<&Record> for FlatRecord {
    fn from(record: &Record) -> Self {
        Self {
            property: record.source_target.clone(),
            author: record.author.clone(),
            rating: record.rating.map(format_rating),
            text: record.text.clone(),
            date: record.date.clone(),
            date_estimated: record.date_estimated,
            scraped_at: record.scraped_at,
        }
    }
}

impl FlatRecord {
    /// A clearly marked record for checking the sink wiring.
    pub fn ping() -> Self {
        Self {
            property: PING_PROPERTY.to_string(),
            author: Some("gleaner".to_string()),
            rating: Some(format_rating(5.0)),
            text: Some("Connectivity check, safe to delete".to_string()),
            date: Some("today".to_string()),
            date_estimated: Some(Utc::now().date_naive()),
            scraped_at: Utc::now(),
        }
    }
}

/// "5" for whole stars, "4.5" otherwise.
pub fn format_rating(rating: f64) -> String {
    rating.to_string()
}

/// Destination for batches of flat records.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Deliver one batch. Anything but a confirmed success is an error.
    async fn send(&self, batch: &[FlatRecord]) -> Result<()>;
}

#[derive(Debug)]
pub struct BatchFailure {
    /// Zero-based batch index
    pub index: usize,
    pub records: usize,
    pub attempts: u32,
    pub error: GleanerError,
}

/// Outcome of dispatching one target's records.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub batches: usize,
    pub records_sent: usize,
    pub failures: Vec<BatchFailure>,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn records_failed(&self) -> usize {
        self.failures.iter().map(|f| f.records).sum()
    }

    /// True when there was something to send and nothing arrived.
    pub fn all_failed(&self) -> bool {
        self.batches > 0 && self.failures.len() == self.batches
    }
}

pub struct Dispatcher<S> {
    sink: S,
    config: SinkConfig,
}

impl<S: Sink> Dispatcher<S> {
    pub fn new(sink: S, config: SinkConfig) -> Self {
        Self { sink, config }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub async fn dispatch(&self, records: &[Record]) -> DispatchReport {
        let flat: Vec<FlatRecord> = records.iter().map(FlatRecord::from).collect();
        self.dispatch_flat(&flat).await
    }

    pub async fn dispatch_flat(&self, records: &[FlatRecord]) -> DispatchReport {
        let mut report = DispatchReport::default();
        if records.is_empty() {
            return report;
        }

        let batch_size = self.config.batch_size.max(1);
        let total_batches = records.len().div_ceil(batch_size);

        for (index, batch) in records.chunks(batch_size).enumerate() {
            if index > 0 && !self.config.inter_batch_delay().is_zero() {
                tokio::time::sleep(self.config.inter_batch_delay()).await;
            }

            report.batches += 1;
            match self.send_with_retry(batch).await {
                Ok(attempts) => {
                    report.records_sent += batch.len();
                    info!(
                        "Batch {}/{} delivered ({} records, {} attempt(s))",
                        index + 1,
                        total_batches,
                        batch.len(),
                        attempts
                    );
                }
                Err((attempts, error)) => {
                    warn!(
                        "Batch {}/{} failed after {} attempt(s): {}",
                        index + 1,
                        total_batches,
                        attempts,
                        error
                    );
                    report.failures.push(BatchFailure {
                        index,
                        records: batch.len(),
                        attempts,
                        error,
                    });
                }
            }
        }

        report
    }

    async fn send_with_retry(&self, batch: &[FlatRecord]) -> std::result::Result<u32, (u32, GleanerError)> {
        let limit = self.config.retry_limit.max(1);
        let mut attempt = 1;

        loop {
            match self.sink.send(batch).await {
                Ok(()) => return Ok(attempt),
                Err(e) if attempt >= limit => return Err((attempt, e)),
                Err(e) => {
                    let wait = self.config.backoff(attempt);
                    warn!("Attempt {}/{} failed: {}, retrying in {:?}", attempt, limit, e, wait);
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fails the first `failures` calls with a 500, then accepts.
    #[derive(Default)]
    struct ScriptedSink {
        failures: usize,
        fail_batches_starting_with: Option<String>,
        calls: AtomicUsize,
        received: Mutex<Vec<Vec<FlatRecord>>>,
    }

    impl ScriptedSink {
        fn failing(failures: usize) -> Self {
            Self {
                failures,
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Sink for ScriptedSink {
        async fn send(&self, batch: &[FlatRecord]) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let poisoned = self
                .fail_batches_starting_with
                .as_deref()
                .is_some_and(|p| batch[0].author.as_deref() == Some(p));
            if call < self.failures || poisoned {
                return Err(GleanerError::SinkStatus {
                    status: 500,
                    body: "internal error".into(),
                });
            }
            self.received.lock().unwrap().push(batch.to_vec());
            Ok(())
        }
    }

    fn config(retry_limit: u32, batch_size: usize) -> SinkConfig {
        SinkConfig {
            endpoint: Some("http://localhost/hook".into()),
            batch_size,
            retry_limit,
            backoff_base_ms: 1,
            backoff_max_ms: 4,
            inter_batch_delay_ms: 0,
            ..Default::default()
        }
    }

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let mut r = Record::new("Hammond");
                r.author = Some(format!("Author {}", i));
                r.rating = Some(4.5);
                r
            })
            .collect()
    }

    #[tokio::test]
    async fn test_always_failing_sink_gets_exactly_retry_limit_attempts() {
        for limit in [1, 2, 3, 5] {
            let dispatcher = Dispatcher::new(ScriptedSink::failing(usize::MAX), config(limit, 100));
            let report = dispatcher.dispatch(&records(3)).await;

            assert_eq!(dispatcher.sink().calls(), limit as usize);
            assert_eq!(report.failures.len(), 1);
            assert_eq!(report.failures[0].attempts, limit);
            assert!(report.all_failed());
            assert_eq!(report.records_sent, 0);
        }
    }

    #[tokio::test]
    async fn test_flaky_sink_recovers() {
        let dispatcher = Dispatcher::new(ScriptedSink::failing(2), config(3, 100));
        let report = dispatcher.dispatch(&records(3)).await;

        assert!(report.is_complete());
        assert_eq!(report.records_sent, 3);
        assert_eq!(dispatcher.sink().calls(), 3);
    }

    #[tokio::test]
    async fn test_batches_in_order() {
        let dispatcher = Dispatcher::new(ScriptedSink::default(), config(3, 100));
        let report = dispatcher.dispatch(&records(250)).await;

        assert_eq!(report.batches, 3);
        assert_eq!(report.records_sent, 250);
        let received = dispatcher.sink().received.lock().unwrap();
        let sizes: Vec<usize> = received.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(received[1][0].author.as_deref(), Some("Author 100"));
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_later_batches() {
        let sink = ScriptedSink {
            fail_batches_starting_with: Some("Author 2".into()),
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(sink, config(2, 2));
        let report = dispatcher.dispatch(&records(6)).await;

        assert_eq!(report.batches, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.records_sent, 4);
        assert_eq!(report.records_failed(), 2);
        assert!(!report.all_failed());
    }

    #[tokio::test]
    async fn test_nothing_to_send() {
        let dispatcher = Dispatcher::new(ScriptedSink::default(), config(3, 100));
        let report = dispatcher.dispatch(&[]).await;

        assert_eq!(dispatcher.sink().calls(), 0);
        assert!(report.is_complete());
        assert!(!report.all_failed());
    }

    #[test]
    fn test_flat_record_shape() {
        let mut record = Record::new("Hammond");
        record.author = Some("Jane".into());
        record.rating = Some(5.0);

        let flat = FlatRecord::from(&record);
        assert_eq!(flat.property, "Hammond");
        assert_eq!(flat.rating.as_deref(), Some("5"));

        let json = serde_json::to_value(&flat).unwrap();
        assert_eq!(json["rating"], "5");
        assert!(json["text"].is_null());
        assert!(json.get("source_target").is_none());
    }

    #[test]
    fn test_format_rating() {
        assert_eq!(format_rating(5.0), "5");
        assert_eq!(format_rating(4.5), "4.5");
        assert_eq!(format_rating(0.0), "0");
    }
}
