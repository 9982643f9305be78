//! Admission decisions and the terminal outcomes that produce them.

use crate::error::RejectionKind;

/// The gate's single output per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Forward the request unchanged.
    Allow,
    /// Answer immediately with the given rejection.
    Reject(Rejection),
}

impl Decision {
    /// Returns `true` for [`Decision::Allow`].
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// HTTP status of a rejection, `None` when allowed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Decision::Allow => None,
            Decision::Reject(rejection) => Some(rejection.status),
        }
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Decision::Allow => None,
            Decision::Reject(rejection) => Some(rejection),
        }
    }
}

/// An immediate rejection: status, message and internal kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Internal classification, kept distinct even when statuses collide.
    pub kind: RejectionKind,
    /// HTTP status code.
    pub status: u16,
    /// Human-readable message written into the response body.
    pub message: String,
}

impl Rejection {
    /// Creates a rejection whose status follows from `kind`.
    pub fn new(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: kind.status(),
            message: message.into(),
        }
    }
}

/// Every way evaluation can terminate.
///
/// Each outcome maps to exactly one metrics counter and one [`Decision`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `HEAD` is banned everywhere.
    HeadRejected,
    /// `OPTIONS` is banned everywhere.
    OptionsRejected,
    /// A required `Authorization` header was absent.
    AuthHeaderMissing(String),
    /// `DELETE` outside the profile-picture path.
    DeleteRejected,
    /// Method outside GET, POST, PUT and DELETE.
    UnsupportedMethod(String),
    /// `GET /healthz` carried an `Authorization` header.
    HealthzAuthHeaderPresent,
    /// `/healthz` admitted without further checks.
    HealthzAdmitted,
    /// `POST` to an open path carried an `Authorization` header.
    PostAuthHeaderPresent,
    /// `GET` verify carried an `Authorization` header.
    VerifyAuthHeaderPresent,
    /// `GET` verify admitted without further checks.
    VerifyAdmitted,
    /// The datastore health probe reported unhealthy.
    DatabaseUnavailable,
    /// A collaborator failed and the gate converts failures to rejections.
    DependencyFailure,
    /// Register carried an `Authorization` header.
    RegisterAuthHeaderPresent,
    /// A public path admitted after the health check.
    PublicAdmitted,
    /// The header did not yield a usable Basic credential.
    AuthHeaderInvalid,
    /// No directory record for the credential's username.
    UserNotFound,
    /// The directory record is not verified.
    UserNotVerified,
    /// A verified user admitted to a protected path.
    Admitted,
}

impl Outcome {
    /// Name of the counter incremented when evaluation ends here.
    pub fn counter(&self) -> &'static str {
        match self {
            Outcome::HeadRejected => "api.request.head.failure",
            Outcome::OptionsRejected => "api.request.options.failure",
            Outcome::AuthHeaderMissing(_) => "api.request.authHeader.missing",
            Outcome::DeleteRejected => "api.request.delete.failure",
            Outcome::UnsupportedMethod(_) => "api.request.unsupportedMethod",
            Outcome::HealthzAuthHeaderPresent => "api.request.healthz.authHeaderPresent",
            Outcome::HealthzAdmitted => "api.request.healthz.success",
            Outcome::PostAuthHeaderPresent => "api.request.postWithAuthHeader.failure",
            Outcome::VerifyAuthHeaderPresent => "api.request.user.verifyWithAuthHeader.failure",
            Outcome::VerifyAdmitted => "api.request.user.verify",
            Outcome::DatabaseUnavailable => "api.request.dbConnection.failure",
            Outcome::DependencyFailure => "api.request.dependency.failure",
            Outcome::RegisterAuthHeaderPresent => "api.request.registerWithAuthHeader.failure",
            Outcome::PublicAdmitted => "api.request.public.success",
            Outcome::AuthHeaderInvalid => "api.request.authHeader.invalid",
            Outcome::UserNotFound => "api.request.user.notFound",
            Outcome::UserNotVerified => "api.request.user.notVerified",
            Outcome::Admitted => "api.request.success",
        }
    }

    /// The decision this outcome produces.
    pub fn decision(&self) -> Decision {
        use RejectionKind::*;

        let (kind, message) = match self {
            Outcome::HealthzAdmitted
            | Outcome::VerifyAdmitted
            | Outcome::PublicAdmitted
            | Outcome::Admitted => return Decision::Allow,
            Outcome::HeadRejected => (MethodNotAllowed, "HEAD method is not allowed.".to_string()),
            Outcome::OptionsRejected => (
                MethodNotAllowed,
                "OPTIONS method is not allowed.".to_string(),
            ),
            Outcome::AuthHeaderMissing(message) => (MissingOrInvalidAuthHeader, message.clone()),
            Outcome::DeleteRejected => (
                MethodNotAllowed,
                "DELETE method is not allowed for this endpoint.".to_string(),
            ),
            Outcome::UnsupportedMethod(method) => (
                MethodNotAllowed,
                format!("HTTP method {method} is not supported."),
            ),
            Outcome::HealthzAuthHeaderPresent => (
                MissingOrInvalidAuthHeader,
                "healthz request with Authorization header is not required.".to_string(),
            ),
            Outcome::PostAuthHeaderPresent => (
                MissingOrInvalidAuthHeader,
                "POST request with Authorization header is not required.".to_string(),
            ),
            Outcome::VerifyAuthHeaderPresent => (
                MissingOrInvalidAuthHeader,
                "Authorization header is not allowed for verify".to_string(),
            ),
            Outcome::DatabaseUnavailable => (
                DependencyUnavailable,
                "Service unavailable due to database connection issue.".to_string(),
            ),
            Outcome::DependencyFailure => (
                DependencyUnavailable,
                "Service unavailable due to dependency failure.".to_string(),
            ),
            Outcome::RegisterAuthHeaderPresent => (
                MissingOrInvalidAuthHeader,
                "Authorization header is not allowed for register".to_string(),
            ),
            Outcome::AuthHeaderInvalid => (
                MissingOrInvalidAuthHeader,
                "Invalid Authorization header".to_string(),
            ),
            Outcome::UserNotFound => (UserNotFound, "User does not exist.".to_string()),
            Outcome::UserNotVerified => (
                UserUnverified,
                "User is not verified. Access is restricted.".to_string(),
            ),
        };

        Decision::Reject(Rejection::new(kind, message))
    }
}
