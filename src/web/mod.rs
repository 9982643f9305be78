//! Web framework integration surface.
//!
//! This module is the boundary between an HTTP framework and the admission
//! gate. It handles:
//! - Mapping raw request parts (method, URI, headers, body length) to a
//!   [`RequestSnapshot`](crate::RequestSnapshot)
//! - Running the gate and turning its decision into "forward" or "respond"
//!
//! It contains no framework-specific code. A framework integration either
//! fills a [`RequestAdapter`] or implements [`ExtractSnapshot`] for its own
//! request type, then calls [`admit`] from its middleware layer.
//!
//! # Example Flow
//!
//! ```ignore
//! // Inside a framework middleware:
//! let mut adapter = RequestAdapter::new(request_id, req.method().as_str(), req.uri().to_string());
//! for (name, value) in req.headers() {
//!     adapter.add_header(name.as_str(), value.to_str()?);
//! }
//!
//! match admit(&gate, &adapter)? {
//!     Admission::Forward => next.run(req).await,
//!     Admission::Respond(response) => write_response(response),
//! }
//! ```

mod adapter;
mod extract;
mod middleware;

pub use adapter::RequestAdapter;
pub use extract::ExtractSnapshot;
pub use middleware::{admit, Admission};
