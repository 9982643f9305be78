//! Request adapter for mapping raw HTTP request parts to a snapshot.

use crate::RequestSnapshot;

use super::ExtractSnapshot;

const AUTHORIZATION: &str = "authorization";

/// Framework-agnostic holder for the request parts the gate needs.
///
/// Framework code fills an adapter from its own request type (method, raw
/// URI, headers, body length) and hands it to
/// [`admit`](super::admit). Header names are matched case-insensitively; the
/// URI's query string is stripped from the path and only its presence is
/// kept.
///
/// # Examples
///
/// ```
/// use admission_gate::web::{ExtractSnapshot, RequestAdapter};
///
/// let mut adapter = RequestAdapter::new("req-12345", "get", "/api/v1/users/verify?token=abc");
/// adapter.add_header("User-Agent", "curl/8.0");
///
/// let snapshot = adapter.extract_snapshot();
/// assert_eq!(snapshot.method(), "GET");
/// assert_eq!(snapshot.path(), "/api/v1/users/verify");
/// assert!(snapshot.has_query());
/// assert!(!snapshot.has_auth_header());
/// ```
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    request_id: String,
    method: String,
    uri: String,
    headers: Vec<(String, String)>,
    content_length: u64,
}

impl RequestAdapter {
    /// Creates an adapter with no headers and an empty body.
    pub fn new(
        request_id: impl Into<String>,
        method: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            method: method.into(),
            uri: uri.into(),
            headers: Vec::new(),
            content_length: 0,
        }
    }

    /// Adds a request header. Repeated names are kept in arrival order.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Records the request body length in bytes.
    pub fn set_content_length(&mut self, content_length: u64) {
        self.content_length = content_length;
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// First value of the header named `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn split_uri(&self) -> (&str, bool) {
        match self.uri.split_once('?') {
            Some((path, _query)) => (path, true),
            None => (self.uri.as_str(), false),
        }
    }
}

impl ExtractSnapshot for RequestAdapter {
    fn extract_snapshot(&self) -> RequestSnapshot {
        let (path, has_query) = self.split_uri();
        let snapshot = RequestSnapshot::new(self.request_id.clone(), &self.method, path)
            .with_query(has_query)
            .with_content_length(self.content_length);

        match self.header(AUTHORIZATION) {
            Some(value) => snapshot.with_auth_header(value),
            None => snapshot,
        }
    }
}
