//! Metrics hooks for the book API.
//!
//! Handlers never touch a global registry. They receive a [`MetricsSink`]
//! through the application state and call [`MetricsSink::increment`] or time
//! work with `start_timer`, which records when the returned [`Timer`] drops.
//!
//! Two sinks are provided:
//!
//! - [`RecorderSink`] forwards to the [`metrics`] facade, which the binary
//!   connects to a Prometheus exporter with [`install_prometheus`].
//! - [`InMemoryMetrics`] keeps everything in process, for tests and embedding.
//!
//! # Metric Names
//!
//! ## Counters
//! - `books` - Every call to a `/books` endpoint
//! - `books-bad-input` - Requests rejected as the caller's fault (400, 404, 409)
//! - `books-error` - Requests that failed internally (500)
//! - `greeting` - Landing page views
//!
//! ## Timers
//! - `greetingTimer` - Landing page render time

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{BookError, Result};

/// Counter incremented by every `/books` endpoint.
pub const BOOKS: &str = "books";
/// Counter incremented when a request is rejected as bad input.
pub const BOOKS_BAD_INPUT: &str = "books-bad-input";
/// Counter incremented when a request fails internally.
pub const BOOKS_ERROR: &str = "books-error";
/// Counter incremented by the landing page.
pub const GREETING: &str = "greeting";
/// Timer recording landing page render time.
pub const GREETING_TIMER: &str = "greetingTimer";

/// Destination for counters and timers.
///
/// Implementations must accept concurrent calls from many requests. Counters
/// only ever go up, so no ordering between concurrent updates is required.
pub trait MetricsSink: Send + Sync {
    /// Add one to the named counter.
    fn increment(&self, name: &'static str);

    /// Record one observation on the named timer.
    fn record_time(&self, name: &'static str, elapsed: Duration);
}

impl<'s> dyn MetricsSink + 's {
    /// Start timing. The elapsed time is recorded when the returned
    /// [`Timer`] is stopped or dropped.
    pub fn start_timer(&self, name: &'static str) -> Timer<'_> {
        Timer {
            sink: self,
            name,
            started: Instant::now(),
            recorded: false,
        }
    }
}

/// A running timer bound to a [`MetricsSink`].
#[must_use = "a timer records when dropped; bind it to a variable"]
pub struct Timer<'a> {
    sink: &'a dyn MetricsSink,
    name: &'static str,
    started: Instant,
    recorded: bool,
}

impl Timer<'_> {
    /// Stop the timer, record it and return the elapsed time.
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let elapsed = self.started.elapsed();
        if !self.recorded {
            self.sink.record_time(self.name, elapsed);
            self.recorded = true;
        }
        elapsed
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.record();
    }
}

impl fmt::Debug for Timer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.name)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

/// Sink that forwards to the global [`metrics`] recorder.
///
/// With no recorder installed every call is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecorderSink;

impl RecorderSink {
    /// Register descriptions for every metric the API emits.
    ///
    /// Call once at startup, after installing a recorder.
    pub fn describe() {
        describe_counter!(BOOKS, "Calls to any /books endpoint");
        describe_counter!(
            BOOKS_BAD_INPUT,
            "Requests rejected because of the caller's input"
        );
        describe_counter!(BOOKS_ERROR, "Requests that failed internally");
        describe_counter!(GREETING, "Landing page views");
        describe_histogram!(
            GREETING_TIMER,
            metrics::Unit::Seconds,
            "Time taken to render the landing page"
        );

        tracing::info!("Book metrics registered");
    }
}

impl MetricsSink for RecorderSink {
    fn increment(&self, name: &'static str) {
        metrics::counter!(name).increment(1);
    }

    fn record_time(&self, name: &'static str, elapsed: Duration) {
        metrics::histogram!(name).record(elapsed.as_secs_f64());
    }
}

/// Install the Prometheus exporter as the global recorder, serving scrapes on
/// `addr`.
///
/// Must be called from inside a Tokio runtime.
///
/// # Errors
///
/// Returns an error if the listener cannot be set up or a recorder is already
/// installed.
pub fn install_prometheus(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| BookError::Metrics(e.to_string()))?;

    RecorderSink::describe();
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Aggregated observations for one timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Number of observations.
    pub count: u64,
    /// Sum of all observations.
    pub total: Duration,
    /// Longest observation.
    pub max: Duration,
}

#[derive(Debug, Default)]
struct Registry {
    counters: HashMap<&'static str, u64>,
    timers: HashMap<&'static str, TimerStats>,
}

/// Sink that keeps counters and timers in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    registry: Mutex<Registry>,
}

impl InMemoryMetrics {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter; zero if it was never incremented.
    pub fn counter(&self, name: &str) -> u64 {
        self.lock().counters.get(name).copied().unwrap_or(0)
    }

    /// Aggregated observations of a timer.
    pub fn timer(&self, name: &str) -> TimerStats {
        self.lock().timers.get(name).copied().unwrap_or_default()
    }

    /// All counters, sorted by name.
    pub fn counters(&self) -> Vec<(&'static str, u64)> {
        let mut counters: Vec<_> = self
            .lock()
            .counters
            .iter()
            .map(|(name, value)| (*name, *value))
            .collect();
        counters.sort_unstable();
        counters
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        // A panic while holding the lock cannot leave a counter half-written.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment(&self, name: &'static str) {
        *self.lock().counters.entry(name).or_insert(0) += 1;
    }

    fn record_time(&self, name: &'static str, elapsed: Duration) {
        let mut registry = self.lock();
        let stats = registry.timers.entry(name).or_default();
        stats.count += 1;
        stats.total += elapsed;
        stats.max = stats.max.max(elapsed);
    }
}
