//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use admission_gate::{
    AdmissionGate, DirectoryError, HealthProbe, InMemoryDirectory, InMemoryMetrics, ProbeError,
    UserDirectory, UserRecord,
};
use base64::Engine;

pub const VERIFIED: &str = "alice@example.com";
pub const UNVERIFIED: &str = "bob@example.com";
pub const UNKNOWN: &str = "carol@example.com";

/// Probe whose answer can be flipped and whose calls are counted.
pub struct SwitchProbe {
    healthy: AtomicBool,
    calls: AtomicUsize,
}

impl SwitchProbe {
    pub fn new(healthy: bool) -> Self {
        Self {
            healthy: AtomicBool::new(healthy),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HealthProbe for SwitchProbe {
    fn check(&self) -> Result<bool, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.healthy.load(Ordering::SeqCst))
    }
}

/// Directory that counts lookups and delegates to an in-memory store.
pub struct CountingDirectory {
    inner: InMemoryDirectory,
    calls: AtomicUsize,
}

impl CountingDirectory {
    pub fn standard() -> Self {
        Self {
            inner: InMemoryDirectory::new()
                .with_user(UserRecord::new(VERIFIED, true))
                .with_user(UserRecord::new(UNVERIFIED, false)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UserDirectory for CountingDirectory {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_email(email)
    }
}

/// A gate with observable collaborators.
pub struct Harness {
    pub gate: AdmissionGate,
    pub probe: Arc<SwitchProbe>,
    pub directory: Arc<CountingDirectory>,
    pub metrics: Arc<InMemoryMetrics>,
}

impl Harness {
    pub fn new(healthy: bool) -> Self {
        let probe = Arc::new(SwitchProbe::new(healthy));
        let directory = Arc::new(CountingDirectory::standard());
        let metrics = Arc::new(InMemoryMetrics::new());
        let gate = AdmissionGate::new(probe.clone(), directory.clone()).with_metrics(metrics.clone());

        Self {
            gate,
            probe,
            directory,
            metrics,
        }
    }
}

/// Encodes `user:password` as a Basic header value.
pub fn basic(user: &str, password: &str) -> String {
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"))
    )
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
