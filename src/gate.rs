use std::sync::Arc;

use serde::Deserialize;

use crate::config::{ConfigError, GateConfig};
use crate::decision::{Decision, Outcome};
use crate::directory::UserDirectory;
use crate::error::{GateError, RejectionKind};
use crate::health::{HealthProbe, TimeoutProbe};
use crate::logging::GateLog;
use crate::metrics::{method_counter, MetricsSink, NoopMetrics, REQUEST_TOTAL};
use crate::policy::{PolicyTable, RuleContext, Step, ADMISSION_TABLE};
use crate::RequestSnapshot;

/// What the gate does when a collaborator fails outright.
///
/// A probe answering "unhealthy" or a directory answering "not found" are
/// ordinary outcomes; this policy only covers the probe or the lookup
/// returning an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return the [`GateError`] to the caller.
    #[default]
    Propagate,
    /// Convert the failure into a 503 rejection.
    Reject,
}

/// The admission gateway.
///
/// An `AdmissionGate` binds its collaborators once, at construction, and is
/// immutable afterwards. It is `Send + Sync` and meant to be shared (behind an
/// `Arc` or a `&'static`) by every request-handling thread.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use admission_gate::{AdmissionGate, InMemoryDirectory, ProbeError, RequestSnapshot, UserRecord};
///
/// let directory = InMemoryDirectory::new()
///     .with_user(UserRecord::new("alice@example.com", true));
/// let gate = AdmissionGate::new(
///     Arc::new(|| -> Result<bool, ProbeError> { Ok(true) }),
///     Arc::new(directory),
/// );
///
/// let head = RequestSnapshot::new("req-1", "HEAD", "/healthz");
/// assert_eq!(gate.evaluate(&head).unwrap().status(), Some(405));
///
/// let healthz = RequestSnapshot::new("req-2", "GET", "/healthz");
/// assert!(gate.evaluate(&healthz).unwrap().is_allow());
/// ```
pub struct AdmissionGate {
    probe: Arc<dyn HealthProbe>,
    directory: Arc<dyn UserDirectory>,
    metrics: Arc<dyn MetricsSink>,
    failure_policy: FailurePolicy,
    table: &'static PolicyTable,
}

impl AdmissionGate {
    /// Creates a gate with no-op metrics and [`FailurePolicy::Propagate`].
    pub fn new(probe: Arc<dyn HealthProbe>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            probe,
            directory,
            metrics: Arc::new(NoopMetrics),
            failure_policy: FailurePolicy::default(),
            table: &ADMISSION_TABLE,
        }
    }

    /// Builds a gate from configuration.
    ///
    /// The probe is wrapped in a [`TimeoutProbe`] bounded by
    /// `health.timeout_ms`, and the metrics sink is chosen from the
    /// `[metrics]` section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid or the metrics
    /// sink cannot be created.
    pub fn from_config(
        config: &GateConfig,
        probe: Arc<dyn HealthProbe>,
        directory: Arc<dyn UserDirectory>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let metrics = config.metrics.build_sink()?;
        let probe = Arc::new(TimeoutProbe::new(probe, config.health.timeout()));

        Ok(Self::new(probe, directory)
            .with_metrics(metrics)
            .with_failure_policy(config.failure_policy))
    }

    /// Replaces the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Sets the collaborator failure policy.
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// The configured failure policy.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Evaluates one request.
    ///
    /// Increments the total and per-method request counters, runs the
    /// admission table in order and stops at the first terminal rule. The
    /// health probe and directory are only consulted if evaluation reaches
    /// their rules. The counter for the terminal outcome is incremented
    /// before returning.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] when a collaborator fails and the gate uses
    /// [`FailurePolicy::Propagate`].
    pub fn evaluate(&self, request: &RequestSnapshot) -> Result<Decision, GateError> {
        let log = GateLog::for_request(request);

        self.metrics.increment(REQUEST_TOTAL);
        self.metrics.increment(&method_counter(request.method()));

        let ctx = RuleContext {
            request,
            probe: self.probe.as_ref(),
            directory: self.directory.as_ref(),
            metrics: self.metrics.as_ref(),
        };

        for rule in self.table.rules() {
            match rule.evaluate(&ctx) {
                Ok(Step::Continue) => {
                    log.debug(format_args!("rule {} passed", rule.name()));
                }
                Ok(Step::Done(outcome)) => return Ok(self.finish(&log, rule.name(), outcome)),
                Err(err) => return self.collaborator_failed(&log, rule.name(), err),
            }
        }

        let fallback = self.table.fallback();
        match fallback.evaluate(&ctx) {
            Ok(outcome) => Ok(self.finish(&log, fallback.name(), outcome)),
            Err(err) => self.collaborator_failed(&log, fallback.name(), err),
        }
    }

    fn finish(&self, log: &GateLog<'_>, rule: &str, outcome: Outcome) -> Decision {
        self.metrics.increment(outcome.counter());
        let decision = outcome.decision();

        match &decision {
            Decision::Allow => {
                log.debug(format_args!("admitted by rule {rule} ({})", outcome.counter()));
            }
            Decision::Reject(rejection) => {
                let emit = if rejection.kind == RejectionKind::DependencyUnavailable {
                    GateLog::warn
                } else {
                    GateLog::info
                };
                emit(
                    log,
                    format_args!(
                        "rejected by rule {rule}: status={} kind={} outcome={}",
                        rejection.status,
                        rejection.kind,
                        outcome.counter()
                    ),
                );
            }
        }
        decision
    }

    fn collaborator_failed(
        &self,
        log: &GateLog<'_>,
        rule: &str,
        err: GateError,
    ) -> Result<Decision, GateError> {
        log.error(format_args!("rule {rule} failed: {err}"));
        match self.failure_policy {
            FailurePolicy::Propagate => Err(err),
            FailurePolicy::Reject => Ok(self.finish(log, rule, Outcome::DependencyFailure)),
        }
    }
}

impl std::fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("failure_policy", &self.failure_policy)
            .field("rules", &self.table.rules().len())
            .finish_non_exhaustive()
    }
}
