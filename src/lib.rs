//! Request-admission gateway for the user-account service.
//!
//! Every request passes through an [`AdmissionGate`] before it reaches
//! business logic. The gate evaluates a fixed, ordered table of rules keyed on
//! HTTP method, path, `Authorization` header presence and two live checks (a
//! datastore [`HealthProbe`] and a [`UserDirectory`] lookup), and produces
//! exactly one [`Decision`]: forward the request, or reject it with a status
//! code and a one-line JSON body.
//!
//! # Core Types
//!
//! - [`RequestSnapshot`]: immutable per-request view the rules read
//! - [`AdmissionGate`]: immutable gateway value, collaborators bound at construction
//! - [`Decision`] / [`Rejection`]: the gate's output
//! - [`extract_credential`]: Basic credential parsing
//! - [`encode`]: rejection → status, headers, JSON body
//! - [`web`]: framework-agnostic request adapter and middleware entry point
//! - [`GateConfig`]: TOML configuration for metrics, probe timeout and failure policy
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use admission_gate::{
//!     AdmissionGate, Decision, InMemoryDirectory, ProbeError, RequestSnapshot, UserRecord,
//! };
//!
//! let directory = InMemoryDirectory::new()
//!     .with_user(UserRecord::new("alice@example.com", true));
//! let gate = AdmissionGate::new(
//!     Arc::new(|| -> Result<bool, ProbeError> { Ok(true) }),
//!     Arc::new(directory),
//! );
//!
//! // "alice@example.com:hunter2"
//! let request = RequestSnapshot::new("req-1", "GET", "/api/v1/users/self")
//!     .with_auth_header("Basic YWxpY2VAZXhhbXBsZS5jb206aHVudGVyMg==");
//! assert_eq!(gate.evaluate(&request).unwrap(), Decision::Allow);
//!
//! let request = RequestSnapshot::new("req-2", "DELETE", "/api/v1/users/self");
//! assert_eq!(gate.evaluate(&request).unwrap().status(), Some(405));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod credential;
mod decision;
mod directory;
mod error;
mod gate;
mod health;
mod logging;
pub mod metrics;
pub mod policy;
mod request;
mod response;
mod secret;
pub mod web;

pub use config::{ConfigError, GateConfig};
pub use credential::{extract_credential, Credential};
pub use decision::{Decision, Outcome, Rejection};
pub use directory::{InMemoryDirectory, UserDirectory, UserRecord};
pub use error::{DirectoryError, GateError, ProbeError, RejectionKind};
pub use gate::{AdmissionGate, FailurePolicy};
pub use health::{HealthProbe, TimeoutProbe};
pub use logging::GateLog;
pub use metrics::{InMemoryMetrics, MetricsSink, NoopMetrics, StatsdMetrics};
pub use request::RequestSnapshot;
pub use response::{encode, encode_rejection, GateResponse, JSON_CONTENT_TYPE, NO_CACHE_HEADERS};
pub use secret::Secret;
