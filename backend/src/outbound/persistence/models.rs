//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{fare_rules, system_config};

/// Row struct for reading from the fare_rules table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = fare_rules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FareRuleRow {
    #[expect(dead_code, reason = "schema field, rules are addressed by pair")]
    pub id: i32,
    pub from_zone: i32,
    pub to_zone: i32,
    pub fare: f64,
    #[expect(dead_code, reason = "schema field for future audit trail support")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating fare rule records.
///
/// Callers must pre-normalize the pair so `from_zone <= to_zone`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = fare_rules)]
pub(crate) struct NewFareRuleRow {
    pub from_zone: i32,
    pub to_zone: i32,
    pub fare: f64,
}

/// Row struct for reading from the system_config table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = system_config)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SystemConfigRow {
    #[expect(dead_code, reason = "lookups filter on the key column directly")]
    pub key: String,
    pub value: String,
    #[expect(dead_code, reason = "schema field for future audit trail support")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for seeding configuration entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = system_config)]
pub(crate) struct NewSystemConfigRow<'a> {
    pub key: &'a str,
    pub value: &'a str,
}
