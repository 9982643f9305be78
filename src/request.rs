use crate::Secret;

/// Immutable per-request view consumed by the admission rules.
///
/// Built once per request by the HTTP boundary (see
/// [`RequestAdapter`](crate::web::RequestAdapter)) and never mutated by the
/// rules. The method is normalised to upper case on construction so every
/// method comparison downstream is case-insensitive; the path is kept
/// verbatim and compared exactly.
///
/// The raw `Authorization` header is held as a [`Secret`] so the snapshot can
/// be logged with `{:?}` without exposing credentials.
///
/// # Examples
///
/// ```
/// use admission_gate::RequestSnapshot;
///
/// let snapshot = RequestSnapshot::new("req-1", "get", "/api/v1/users/self")
///     .with_auth_header("Basic YWxpY2U6cHc=");
///
/// assert_eq!(snapshot.method(), "GET");
/// assert!(snapshot.has_auth_header());
/// assert!(!format!("{:?}", snapshot).contains("YWxpY2U6cHc="));
/// ```
#[derive(Debug)]
pub struct RequestSnapshot {
    request_id: String,
    method: String,
    path: String,
    has_query: bool,
    auth_header: Option<Secret<String>>,
    content_length: u64,
}

impl RequestSnapshot {
    /// Creates a snapshot with no query, no `Authorization` header and an
    /// empty body.
    pub fn new(
        request_id: impl Into<String>,
        method: impl AsRef<str>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            method: method.as_ref().to_ascii_uppercase(),
            path: path.into(),
            has_query: false,
            auth_header: None,
            content_length: 0,
        }
    }

    /// Records that the request URI carried a query string.
    pub fn with_query(mut self, has_query: bool) -> Self {
        self.has_query = has_query;
        self
    }

    /// Attaches the raw `Authorization` header value.
    pub fn with_auth_header(mut self, value: impl Into<String>) -> Self {
        self.auth_header = Some(Secret::new(value.into()));
        self
    }

    /// Records the request body length in bytes.
    pub fn with_content_length(mut self, content_length: u64) -> Self {
        self.content_length = content_length;
        self
    }

    /// Identifier used to correlate log events for this request.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Upper-cased request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the request URI carried a query string.
    pub fn has_query(&self) -> bool {
        self.has_query
    }

    /// Request body length in bytes.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Returns `true` when the `Authorization` header is present, even if empty.
    pub fn has_auth_header(&self) -> bool {
        self.auth_header.is_some()
    }

    /// Returns `true` when the header is absent or present with an empty value.
    pub fn auth_header_missing_or_empty(&self) -> bool {
        self.auth_header_value().map_or(true, str::is_empty)
    }

    /// Exposes the raw `Authorization` header for credential extraction.
    pub(crate) fn auth_header_value(&self) -> Option<&str> {
        self.auth_header
            .as_ref()
            .map(|header| header.expose_secret().as_str())
    }

    /// Returns `true` when the method matches `method`, ignoring ASCII case.
    pub fn method_is(&self, method: &str) -> bool {
        self.method.eq_ignore_ascii_case(method)
    }
}
