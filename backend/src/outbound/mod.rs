//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing
//! concrete implementations of domain port traits:
//!
//! - **persistence**: PostgreSQL-backed rule store using Diesel ORM
//! - **cache**: Redis-backed shared fare cache
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod cache;
pub mod persistence;
