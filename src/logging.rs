use std::fmt;

use crate::RequestSnapshot;

/// Request-scoped logger used by the gate.
///
/// Every event carries the request id, method and path as structured
/// `tracing` fields. The `Authorization` header is never recorded.
#[derive(Debug, Clone, Copy)]
pub struct GateLog<'a> {
    request_id: &'a str,
    method: &'a str,
    path: &'a str,
}

impl<'a> GateLog<'a> {
    /// Creates a logger bound to one request.
    pub fn for_request(request: &'a RequestSnapshot) -> Self {
        Self {
            request_id: request.request_id(),
            method: request.method(),
            path: request.path(),
        }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs an info-level message.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
            "{}",
            args
        );
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
            "{}",
            args
        );
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
            "{}",
            args
        );
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
            "{}",
            args
        );
    }
}
