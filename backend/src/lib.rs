//! Rubus API: provisioning and power control for network-booted edge
//! devices.
//!
//! The crate follows a hexagonal layout. `domain` holds entities, ports and
//! services; `outbound` implements the driven ports (PostgreSQL, the
//! power-control provider, provisioning scripts, password hashing and token
//! signing); `inbound::http` exposes the REST surface.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
