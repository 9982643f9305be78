//! Extraction boundary trait for web integration.

use crate::RequestSnapshot;

/// Builds a [`RequestSnapshot`] from a framework-specific request.
///
/// Framework integrations implement this for their own request type (or
/// build a [`RequestAdapter`](super::RequestAdapter), which implements it).
/// Implementations only map data; they must not make admission decisions.
///
/// # Examples
///
/// ```
/// use admission_gate::web::ExtractSnapshot;
/// use admission_gate::RequestSnapshot;
///
/// struct MyFrameworkRequest {
///     id: u64,
///     method: &'static str,
///     path: &'static str,
///     authorization: Option<&'static str>,
/// }
///
/// impl ExtractSnapshot for MyFrameworkRequest {
///     fn extract_snapshot(&self) -> RequestSnapshot {
///         let snapshot = RequestSnapshot::new(self.id.to_string(), self.method, self.path);
///         match self.authorization {
///             Some(value) => snapshot.with_auth_header(value),
///             None => snapshot,
///         }
///     }
/// }
///
/// let request = MyFrameworkRequest {
///     id: 7,
///     method: "get",
///     path: "/healthz",
///     authorization: None,
/// };
/// assert_eq!(request.extract_snapshot().method(), "GET");
/// ```
pub trait ExtractSnapshot {
    /// Produces the immutable snapshot the gate evaluates.
    fn extract_snapshot(&self) -> RequestSnapshot;
}
