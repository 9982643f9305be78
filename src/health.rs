//! Datastore health probing.
//!
//! [`HealthProbe`] is the contract the gate calls at the health step.
//! [`TimeoutProbe`] bounds any probe with an explicit deadline so a degraded
//! datastore cannot stall request threads indefinitely.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::error::ProbeError;

/// Synchronous datastore reachability check.
///
/// `Ok(true)` means healthy, `Ok(false)` unhealthy. `Err` is reserved for the
/// probe itself failing; how the gate treats it is decided by its
/// [`FailurePolicy`](crate::FailurePolicy).
pub trait HealthProbe: Send + Sync {
    /// Checks whether the datastore is reachable.
    fn check(&self) -> Result<bool, ProbeError>;
}

impl<F> HealthProbe for F
where
    F: Fn() -> Result<bool, ProbeError> + Send + Sync,
{
    fn check(&self) -> Result<bool, ProbeError> {
        self()
    }
}

/// Wraps a probe with a bounded wait.
///
/// The inner probe runs on a worker thread and callers wait at most the
/// deadline for its answer. If none arrives the datastore is reported
/// unhealthy. At most one worker exists at a time: callers that arrive while
/// a check is in flight wait on that check instead of starting another, so a
/// hung datastore holds one thread no matter how many requests time out.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use admission_gate::{HealthProbe, ProbeError, TimeoutProbe};
///
/// let inner = Arc::new(|| -> Result<bool, ProbeError> { Ok(true) });
/// let probe = TimeoutProbe::new(inner, Duration::from_millis(500));
/// assert!(probe.check().unwrap());
/// ```
pub struct TimeoutProbe {
    inner: Arc<dyn HealthProbe>,
    timeout: Duration,
    flight: Arc<Flight>,
}

#[derive(Default)]
struct Flight {
    state: Mutex<FlightState>,
    answered: Condvar,
}

#[derive(Default)]
struct FlightState {
    running: bool,
    generation: u64,
    answer: Option<(u64, Result<bool, ProbeError>)>,
}

impl FlightState {
    fn answer_for(&self, generation: u64) -> Option<&Result<bool, ProbeError>> {
        match &self.answer {
            Some((answered, result)) if *answered >= generation => Some(result),
            _ => None,
        }
    }
}

impl Flight {
    fn lock(&self) -> MutexGuard<'_, FlightState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Publishes the worker's answer when dropped, including on unwind.
struct Completion {
    flight: Arc<Flight>,
    generation: u64,
    result: Option<Result<bool, ProbeError>>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        let result = self.result.take().unwrap_or(Err(ProbeError::Disconnected));
        let mut state = self.flight.lock();
        state.running = false;
        state.answer = Some((self.generation, result));
        self.flight.answered.notify_all();
    }
}

impl TimeoutProbe {
    /// Bounds `inner` by `timeout`.
    pub fn new(inner: Arc<dyn HealthProbe>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            flight: Arc::default(),
        }
    }

    /// The configured deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns `true` while a worker is still waiting on the inner probe.
    pub fn in_flight(&self) -> bool {
        self.flight.lock().running
    }

    fn spawn_worker(&self, generation: u64) -> Result<(), ProbeError> {
        let inner = Arc::clone(&self.inner);
        let flight = Arc::clone(&self.flight);

        thread::Builder::new()
            .name("health-probe".to_string())
            .spawn(move || {
                let mut completion = Completion {
                    flight,
                    generation,
                    result: None,
                };
                completion.result = Some(inner.check());
            })
            .map(drop)
            .map_err(|err| ProbeError::Spawn(err.to_string()))
    }
}

impl HealthProbe for TimeoutProbe {
    fn check(&self) -> Result<bool, ProbeError> {
        let mut state = self.flight.lock();

        if !state.running {
            let generation = state.generation + 1;
            // The worker publishes through the lock we hold, so it cannot
            // answer before we start waiting.
            self.spawn_worker(generation)?;
            state.generation = generation;
            state.running = true;
        } else {
            tracing::debug!(
                generation = state.generation,
                "joining health probe already in flight"
            );
        }
        let generation = state.generation;

        let (state, _) = match self.flight.answered.wait_timeout_while(
            state,
            self.timeout,
            |state| state.answer_for(generation).is_none(),
        ) {
            Ok(waited) => waited,
            Err(poisoned) => poisoned.into_inner(),
        };

        match state.answer_for(generation) {
            Some(result) => result.clone(),
            None => {
                tracing::warn!(
                    timeout = ?self.timeout,
                    "health probe timed out; treating datastore as unreachable"
                );
                Ok(false)
            }
        }
    }
}

impl fmt::Debug for TimeoutProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutProbe")
            .field("timeout", &self.timeout)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}
