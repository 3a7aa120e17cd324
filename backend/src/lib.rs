//! Kitchen order relay backend library.
//!
//! Cross-party order handshake and relay protocol: an external website
//! registers its restaurants, performs a handshake to establish a mapping
//! to a kitchen, and pushes orders that the kitchen app reads scoped by
//! the resolved restaurant identifier.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
/// Request tracing middleware.
pub use middleware::Trace;
/// Request-scoped correlation identifier.
pub use domain::TraceId;
