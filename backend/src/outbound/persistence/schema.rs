//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the embedded migrations under
//! `backend/migrations` exactly. They are used by Diesel for compile-time
//! query validation and type-safe SQL generation. When a migration changes
//! the schema, regenerate this file with `diesel print-schema` or update it
//! by hand.

diesel::table! {
    /// Fare rules table.
    ///
    /// One row per unordered zone pair. Rows are written with
    /// `from_zone <= to_zone`; a unique index on the pair enforces the
    /// single-rule-per-pair invariant.
    fare_rules (id) {
        /// Primary key: serial identifier.
        id -> Int4,
        /// Smaller endpoint of the normalized pair.
        from_zone -> Int4,
        /// Larger endpoint of the normalized pair.
        to_zone -> Int4,
        /// Fare charged for a journey between the two zones.
        fare -> Float8,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Flat key/value configuration table.
    ///
    /// Holds operational settings such as the per-batch journey ceiling.
    system_config (key) {
        /// Configuration key (primary key).
        key -> Varchar,
        /// Configuration value, stored as text and parsed by consumers.
        value -> Varchar,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(fare_rules, system_config);
