//! Metrics sinks for admission counters and timers.
//!
//! Metrics are fire-and-forget: sinks never return errors to the gate and
//! never influence a decision. Which sink a gate uses is chosen once, at
//! construction, from [`MetricsConfig`](crate::config::MetricsConfig).

use std::collections::{BTreeMap, VecDeque};
use std::net::UdpSocket;
use std::sync::Mutex;
use std::time::Duration;

/// Counter incremented for every request before any rule runs.
pub const REQUEST_TOTAL: &str = "api.request.total";

/// Timing samples [`InMemoryMetrics`] keeps per timer; older ones are dropped.
pub const TIMING_SAMPLE_LIMIT: usize = 1024;

/// Timer recorded around the datastore health probe.
pub const HEALTH_PROBE_TIMER: &str = "api.request.dbConnection.time.milliseconds";

/// Returns the per-method request counter name, e.g. `api.request.get`.
pub fn method_counter(method: &str) -> String {
    format!("api.request.{}", method.to_ascii_lowercase())
}

/// Sink for admission metrics.
pub trait MetricsSink: Send + Sync {
    /// Increments the named counter by one.
    fn increment(&self, name: &str);
    /// Records a timing observation for the named timer.
    fn record_timing(&self, name: &str, elapsed: Duration);
}

/// No-op metrics sink.
///
/// Used when metrics are disabled in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment(&self, _name: &str) {}

    fn record_timing(&self, _name: &str, _elapsed: Duration) {}
}

/// In-process metrics sink.
///
/// Keeps counters and the most recent [`TIMING_SAMPLE_LIMIT`] timings per
/// timer in memory. Useful for tests and for exposing counters through an
/// application's own status endpoint.
///
/// # Examples
///
/// ```
/// use admission_gate::{InMemoryMetrics, MetricsSink};
///
/// let metrics = InMemoryMetrics::new();
/// metrics.increment("api.request.total");
/// metrics.increment("api.request.total");
///
/// assert_eq!(metrics.count("api.request.total"), 2);
/// assert_eq!(metrics.count("api.request.success"), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: Mutex<BTreeMap<String, u64>>,
    timings: Mutex<BTreeMap<String, VecDeque<Duration>>>,
}

impl InMemoryMetrics {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of the named counter.
    pub fn count(&self, name: &str) -> u64 {
        match self.counters.lock() {
            Ok(counters) => counters.get(name).copied().unwrap_or(0),
            Err(poisoned) => poisoned.into_inner().get(name).copied().unwrap_or(0),
        }
    }

    /// Copy of all counters, ordered by name.
    pub fn counters(&self) -> BTreeMap<String, u64> {
        match self.counters.lock() {
            Ok(counters) => counters.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Retained observations for the named timer, oldest first.
    pub fn timings(&self, name: &str) -> Vec<Duration> {
        let timings = match self.timings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        timings
            .get(name)
            .map(|samples| samples.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment(&self, name: &str) {
        let mut counters = match self.counters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *counters.entry(name.to_string()).or_insert(0) += 1;
    }

    fn record_timing(&self, name: &str, elapsed: Duration) {
        let mut timings = match self.timings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let samples = timings.entry(name.to_string()).or_default();
        if samples.len() == TIMING_SAMPLE_LIMIT {
            samples.pop_front();
        }
        samples.push_back(elapsed);
    }
}

/// StatsD metrics sink over UDP.
///
/// Emits `<prefix>.<name>:1|c` for counters and `<prefix>.<name>:<ms>|ms`
/// for timers. Send failures are logged at `trace` and otherwise ignored.
#[derive(Debug)]
pub struct StatsdMetrics {
    socket: UdpSocket,
    prefix: String,
}

impl StatsdMetrics {
    /// Binds an ephemeral local socket and connects it to `host:port`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the socket cannot be bound or the target
    /// cannot be resolved.
    pub fn connect(prefix: impl Into<String>, host: &str, port: u16) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect((host, port))?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            prefix: prefix.into(),
        })
    }

    fn send(&self, payload: String) {
        if let Err(err) = self.socket.send(payload.as_bytes()) {
            tracing::trace!(error = %err, "dropping statsd packet");
        }
    }

    fn counter_line(&self, name: &str) -> String {
        format!("{}.{}:1|c", self.prefix, name)
    }

    fn timer_line(&self, name: &str, elapsed: Duration) -> String {
        format!("{}.{}:{}|ms", self.prefix, name, elapsed.as_millis())
    }
}

impl MetricsSink for StatsdMetrics {
    fn increment(&self, name: &str) {
        self.send(self.counter_line(name));
    }

    fn record_timing(&self, name: &str, elapsed: Duration) {
        self.send(self.timer_line(name, elapsed));
    }
}
