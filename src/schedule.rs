//! Recurring runs and cooperative shutdown.
//!
//! The scheduler runs the harvest job once at start (unless disabled), then
//! every `interval`. SIGINT/SIGTERM trigger a [`Shutdown`] that the harvester
//! checks between targets and the scheduler checks between runs.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Recurring run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Time between two runs, e.g. "30m", "6h", "7d" (default: "7d")
    pub interval: String,

    /// Run immediately when the scheduler starts (default: true)
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: "7d".to_string(),
            run_on_start: true,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Result<Duration, String> {
        match parse_interval(&self.interval)? {
            0 => Err("Interval must be greater than zero".to_string()),
            secs => Ok(Duration::from_secs(secs)),
        }
    }
}

/// Parse interval string like "1h", "30m", "6h", "1d"
pub fn parse_interval(s: &str) -> Result<u64, String> {
    let s = s.trim().to_lowercase();

    let (amount, unit_secs, unit) = if let Some(hours) = s.strip_suffix('h') {
        (hours, 3600, "hours")
    } else if let Some(minutes) = s.strip_suffix('m') {
        (minutes, 60, "minutes")
    } else if let Some(days) = s.strip_suffix('d') {
        (days, 86400, "days")
    } else if let Some(secs) = s.strip_suffix('s') {
        (secs, 1, "seconds")
    } else {
        return s
            .parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '6h', '30m', '7d'", s));
    };

    amount
        .parse::<u64>()
        .map_err(|_| format!("Invalid {}: {}", unit, amount))?
        .checked_mul(unit_secs)
        .ok_or_else(|| format!("Interval too large: {}", s))
}

/// Format interval for display
pub fn format_interval(secs: u64) -> String {
    if secs >= 86400 && secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// A stop flag shared between the signal listener and the run loop.
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

#[derive(Default)]
struct ShutdownInner {
    triggered: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.inner.triggered.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Resolve once [`trigger`](Self::trigger) was called.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }

    /// Trigger on SIGINT or SIGTERM (Ctrl-C on Windows).
    pub fn listen_for_signals(&self) -> JoinHandle<()> {
        let shutdown = self.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("Shutdown requested, finishing current target");
            shutdown.trigger();
        })
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Failed to install signal handlers: {}", e);
            std::future::pending::<()>().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
}

#[cfg(windows)]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

pub struct Scheduler {
    interval: Duration,
    run_on_start: bool,
}

impl Scheduler {
    pub fn new(interval: Duration, run_on_start: bool) -> Self {
        Self {
            interval,
            run_on_start,
        }
    }

    /// Run `job` until `shutdown` triggers. Returns the number of completed runs.
    pub async fn run<F, Fut>(&self, shutdown: &Shutdown, mut job: F) -> usize
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        info!(
            "Scheduler started (interval: {})",
            format_interval(self.interval.as_secs())
        );

        let mut runs = 0;
        if self.run_on_start && !shutdown.is_triggered() {
            info!("Running initial harvest");
            job().await;
            runs += 1;
        }

        while !shutdown.is_triggered() {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.wait() => break,
            }

            info!("Running scheduled harvest");
            job().await;
            runs += 1;
        }

        info!("Scheduler stopped after {} run(s)", runs);
        runs
    }
}
