use std::fmt;

use thiserror::Error;

/// Errors that escape the gateway instead of becoming a [`Decision`](crate::Decision).
///
/// These only arise when a collaborator fails outright (as opposed to
/// answering "unhealthy" or "not found") and the gate was built with
/// [`FailurePolicy::Propagate`](crate::FailurePolicy::Propagate).
#[derive(Debug, Error)]
pub enum GateError {
    /// The datastore health probe could not produce an answer.
    #[error("health probe failed: {0}")]
    Probe(#[from] ProbeError),
    /// The user directory lookup failed.
    #[error("user directory lookup failed: {0}")]
    Directory(#[from] DirectoryError),
}

/// Failure raised by a [`HealthProbe`](crate::HealthProbe) implementation.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// The probe worker terminated without reporting a result.
    #[error("probe worker exited without a result")]
    Disconnected,
    /// The probe could not be started.
    #[error("probe could not be started: {0}")]
    Spawn(String),
    /// Implementation-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Failure raised by a [`UserDirectory`](crate::UserDirectory) implementation.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The backing store was unreachable.
    #[error("directory backend unavailable: {0}")]
    Unavailable(String),
    /// Implementation-specific failure.
    #[error("{0}")]
    Other(String),
}

/// The kind of rejection produced by the gateway.
///
/// `UserNotFound` and `UserUnverified` share status 403 on the wire but stay
/// distinct here so logs and metrics can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    /// The method is banned globally or on this path (405).
    MethodNotAllowed,
    /// The header is absent when required, present when forbidden, or
    /// carries malformed Basic credentials (400).
    MissingOrInvalidAuthHeader,
    /// A dependency check failed (503).
    DependencyUnavailable,
    /// No directory record matches the credential's username (403).
    UserNotFound,
    /// The directory record exists but is not verified (403).
    UserUnverified,
}

impl RejectionKind {
    /// HTTP status code carried by rejections of this kind.
    pub fn status(self) -> u16 {
        match self {
            RejectionKind::MethodNotAllowed => 405,
            RejectionKind::MissingOrInvalidAuthHeader => 400,
            RejectionKind::DependencyUnavailable => 503,
            RejectionKind::UserNotFound | RejectionKind::UserUnverified => 403,
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionKind::MethodNotAllowed => write!(f, "method_not_allowed"),
            RejectionKind::MissingOrInvalidAuthHeader => {
                write!(f, "missing_or_invalid_auth_header")
            }
            RejectionKind::DependencyUnavailable => write!(f, "dependency_unavailable"),
            RejectionKind::UserNotFound => write!(f, "user_not_found"),
            RejectionKind::UserUnverified => write!(f, "user_unverified"),
        }
    }
}
