//! Encoding of rejections into HTTP responses.

use crate::decision::{Decision, Rejection};

/// Content type of every rejection body.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Headers the service attaches to every response, admitted or rejected.
///
/// The HTTP layer should add these to forwarded responses as well.
pub const NO_CACHE_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
    ("X-Content-Type-Options", "nosniff"),
];

/// A fully encoded rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, including `Content-Type`.
    pub headers: Vec<(&'static str, String)>,
    /// One-line JSON body.
    pub body: String,
}

impl GateResponse {
    /// Value of the first header named `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Encodes a decision.
///
/// `Allow` yields `None`: the request is forwarded and the gate writes
/// nothing. `Reject` yields the response to send back.
///
/// # Examples
///
/// ```
/// use admission_gate::{encode, Decision, Rejection, RejectionKind};
///
/// let decision = Decision::Reject(Rejection::new(
///     RejectionKind::UserNotFound,
///     "User does not exist.",
/// ));
/// let response = encode(&decision).unwrap();
///
/// assert_eq!(response.status, 403);
/// assert_eq!(response.body, r#"{"message": "User does not exist."}"#);
/// assert!(encode(&Decision::Allow).is_none());
/// ```
pub fn encode(decision: &Decision) -> Option<GateResponse> {
    match decision {
        Decision::Allow => None,
        Decision::Reject(rejection) => Some(encode_rejection(rejection)),
    }
}

/// Encodes a rejection as `{"message": <json string>}`.
pub fn encode_rejection(rejection: &Rejection) -> GateResponse {
    let mut headers = Vec::with_capacity(NO_CACHE_HEADERS.len() + 1);
    headers.push(("Content-Type", JSON_CONTENT_TYPE.to_string()));
    headers.extend(
        NO_CACHE_HEADERS
            .iter()
            .map(|(name, value)| (*name, (*value).to_string())),
    );

    GateResponse {
        status: rejection.status,
        headers,
        body: message_body(&rejection.message),
    }
}

fn message_body(message: &str) -> String {
    // Serializing a &str cannot fail.
    let quoted = serde_json::to_string(message).unwrap_or_else(|_| "\"\"".to_string());
    format!("{{\"message\": {quoted}}}")
}
