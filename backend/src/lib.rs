//! Zone-based transit fare service.
//!
//! The crate follows a hexagonal layout: the [`domain`] module holds the
//! fare model, the multi-level cache chain, and the ports; [`inbound`]
//! adapts HTTP requests to domain calls; [`outbound`] implements the ports
//! against PostgreSQL and Redis. The binary in `main.rs` wires the layers
//! together from environment configuration.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
