//! Matching and swap-consistency engine for a clothing-swap marketplace.
//!
//! `domain` holds entities, ports and the swap service; `inbound` exposes
//! the HTTP surface; `outbound` implements the store and push ports.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
