//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! Concrete implementation of the domain's rule-store port backed by
//! PostgreSQL via the Diesel ORM with async support through `diesel-async`
//! and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapter**: the store only translates between Diesel rows and
//!   domain fare types. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are implementation details, never exposed to
//!   the domain layer.
//! - **Strongly typed errors**: all database errors are mapped to the
//!   domain's rule-store error type.

mod diesel_fare_rule_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_fare_rule_store::DieselFareRuleStore;
pub use migrations::migrate_schema;
pub use pool::{DbPool, PoolConfig, PoolError};
