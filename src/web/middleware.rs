//! Middleware entry point: snapshot in, forward-or-respond out.
//!
//! ```text
//! HTTP Request
//!   ↓
//! Framework-specific code builds RequestAdapter (or implements ExtractSnapshot)
//!   ↓
//! admit(&gate, &request)
//!   ↓
//! Admission::Forward           → call the route handler
//! Admission::Respond(response) → write status, headers and body, stop
//! ```

use crate::error::GateError;
use crate::gate::AdmissionGate;
use crate::response::{encode, GateResponse};

use super::ExtractSnapshot;

/// What the HTTP layer should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Pass the request to business logic unchanged.
    Forward,
    /// Write this response and stop.
    Respond(GateResponse),
}

impl Admission {
    /// Returns `true` for [`Admission::Forward`].
    pub fn is_forward(&self) -> bool {
        matches!(self, Admission::Forward)
    }
}

/// Runs the gate for one request and encodes the result.
///
/// # Errors
///
/// Returns [`GateError`] when a collaborator fails and the gate propagates
/// failures; the HTTP layer decides how to answer (usually 500).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use admission_gate::web::{admit, Admission, RequestAdapter};
/// use admission_gate::{AdmissionGate, InMemoryDirectory, ProbeError};
///
/// let gate = AdmissionGate::new(
///     Arc::new(|| -> Result<bool, ProbeError> { Ok(true) }),
///     Arc::new(InMemoryDirectory::new()),
/// );
///
/// let adapter = RequestAdapter::new("req-1", "DELETE", "/api/v1/users/self");
/// match admit(&gate, &adapter).unwrap() {
///     Admission::Respond(response) => assert_eq!(response.status, 405),
///     Admission::Forward => unreachable!(),
/// }
/// ```
pub fn admit<R>(gate: &AdmissionGate, request: &R) -> Result<Admission, GateError>
where
    R: ExtractSnapshot + ?Sized,
{
    let snapshot = request.extract_snapshot();
    let decision = gate.evaluate(&snapshot)?;

    Ok(match encode(&decision) {
        None => Admission::Forward,
        Some(response) => Admission::Respond(response),
    })
}
