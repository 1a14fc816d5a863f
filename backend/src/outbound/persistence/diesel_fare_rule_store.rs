//! PostgreSQL-backed `FareRuleStore` implementation using Diesel ORM.
//!
//! This adapter is a thin translator between Diesel rows and domain fare
//! types. Rows are always written with the pair normalized ascending, but
//! lookups still try the reversed ordering so legacy rows stored before
//! normalization remain reachable.

use std::collections::BTreeMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};

use crate::domain::fare::{Fare, FareRule, Zone, ZonePair};
use crate::domain::ports::{
    DEFAULT_MAX_JOURNEYS, FareRuleStore, FareRuleStoreError, MAX_JOURNEYS_CONFIG_KEY,
    default_fare_rules,
};

use super::models::{FareRuleRow, NewFareRuleRow, NewSystemConfigRow, SystemConfigRow};
use super::pool::{DbPool, PoolError};
use super::schema::{fare_rules, system_config};

/// Map pool errors to rule-store connection errors.
fn map_pool_error(error: PoolError) -> FareRuleStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            FareRuleStoreError::connection(message)
        }
    }
}

/// Map a Diesel error to a rule-store query error and emit debug context.
fn map_diesel_error(error: diesel::result::Error, operation: &str) -> FareRuleStoreError {
    let error_message = error.to_string();
    debug!(%error_message, %operation, "diesel operation failed");
    FareRuleStoreError::query(error_message)
}

/// Convert a database row to a domain rule, skipping rows that fail
/// validation (e.g. a non-positive fare edited directly in the database).
fn row_to_rule(row: &FareRuleRow) -> Option<FareRule> {
    FareRule::new(Zone(row.from_zone), Zone(row.to_zone), row.fare)
        .inspect_err(|reason| {
            warn!(
                from_zone = row.from_zone,
                to_zone = row.to_zone,
                %reason,
                "skipping invalid fare rule row"
            );
        })
        .ok()
}

/// Diesel-backed implementation of the `FareRuleStore` port.
#[derive(Clone)]
pub struct DieselFareRuleStore {
    pool: DbPool,
}

impl DieselFareRuleStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Seed the default rule table and batch ceiling into an empty database.
    ///
    /// No-op when fare rules already exist; existing configuration keys are
    /// never overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error when the database is unreachable or the seed
    /// statements fail.
    pub async fn ensure_seeded(&self) -> Result<(), FareRuleStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rule_count: i64 = fare_rules::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "ensure_seeded"))?;

        if rule_count == 0 {
            let rows: Vec<NewFareRuleRow> = default_fare_rules()
                .into_iter()
                .map(|rule| NewFareRuleRow {
                    from_zone: rule.pair.lower().value(),
                    to_zone: rule.pair.upper().value(),
                    fare: rule.fare.amount(),
                })
                .collect();
            let seeded = diesel::insert_into(fare_rules::table)
                .values(&rows)
                .execute(&mut conn)
                .await
                .map_err(|err| map_diesel_error(err, "ensure_seeded"))?;
            debug!(seeded, "seeded default fare rules");
        }

        let default_limit = DEFAULT_MAX_JOURNEYS.to_string();
        diesel::insert_into(system_config::table)
            .values(NewSystemConfigRow {
                key: MAX_JOURNEYS_CONFIG_KEY,
                value: &default_limit,
            })
            .on_conflict(system_config::key)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "ensure_seeded"))?;

        Ok(())
    }

    async fn fetch_rows(&self) -> Result<Vec<FareRuleRow>, FareRuleStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        fare_rules::table
            .select(FareRuleRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "fetch_rows"))
    }
}

#[async_trait]
impl FareRuleStore for DieselFareRuleStore {
    async fn get_fare(&self, pair: ZonePair) -> Result<Option<Fare>, FareRuleStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (lower, upper) = (pair.lower().value(), pair.upper().value());

        let exact = fare_rules::table
            .filter(
                fare_rules::from_zone
                    .eq(lower)
                    .and(fare_rules::to_zone.eq(upper)),
            )
            .select(fare_rules::fare)
            .first::<f64>(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "get_fare"))?;

        let amount = match exact {
            Some(amount) => Some(amount),
            // Legacy rows may predate pair normalization.
            None if lower != upper => fare_rules::table
                .filter(
                    fare_rules::from_zone
                        .eq(upper)
                        .and(fare_rules::to_zone.eq(lower)),
                )
                .select(fare_rules::fare)
                .first::<f64>(&mut conn)
                .await
                .optional()
                .map_err(|err| map_diesel_error(err, "get_fare"))?,
            None => None,
        };

        match amount {
            Some(amount) => Fare::new(amount)
                .map(Some)
                .map_err(|reason| FareRuleStoreError::query(reason.to_string())),
            None => Ok(None),
        }
    }

    async fn get_all_rules(&self) -> Result<Vec<FareRule>, FareRuleStoreError> {
        let rows = self.fetch_rows().await?;
        // Keyed by normalized pair so a legacy reversed duplicate collapses
        // into one rule.
        let table: BTreeMap<ZonePair, FareRule> = rows
            .iter()
            .filter_map(row_to_rule)
            .map(|rule| (rule.pair, rule))
            .collect();
        Ok(table.into_values().collect())
    }

    async fn get_zones(&self) -> Result<Vec<Zone>, FareRuleStoreError> {
        let rows = self.fetch_rows().await?;
        let mut zones: Vec<Zone> = rows
            .iter()
            .flat_map(|row| [Zone(row.from_zone), Zone(row.to_zone)])
            .collect();
        zones.sort_unstable();
        zones.dedup();
        Ok(zones)
    }

    async fn upsert_rule(&self, rule: FareRule) -> Result<FareRule, FareRuleStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (lower, upper) = (rule.pair.lower().value(), rule.pair.upper().value());

        // Retire any legacy reversed row so the pair stays canonical.
        if lower != upper {
            diesel::delete(
                fare_rules::table.filter(
                    fare_rules::from_zone
                        .eq(upper)
                        .and(fare_rules::to_zone.eq(lower)),
                ),
            )
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "upsert_rule"))?;
        }

        diesel::insert_into(fare_rules::table)
            .values(NewFareRuleRow {
                from_zone: lower,
                to_zone: upper,
                fare: rule.fare.amount(),
            })
            .on_conflict((fare_rules::from_zone, fare_rules::to_zone))
            .do_update()
            .set((
                fare_rules::fare.eq(rule.fare.amount()),
                fare_rules::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "upsert_rule"))?;

        Ok(rule)
    }

    async fn add_zone(&self, zone: Zone, rules: Vec<FareRule>) -> Result<(), FareRuleStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<NewFareRuleRow> = rules
            .iter()
            .map(|rule| NewFareRuleRow {
                from_zone: rule.pair.lower().value(),
                to_zone: rule.pair.upper().value(),
                fare: rule.fare.amount(),
            })
            .collect();

        // Single multi-row insert: the whole zone lands or none of it does.
        let inserted = diesel::insert_into(fare_rules::table)
            .values(&rows)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "add_zone"))?;
        debug!(zone = zone.value(), inserted, "registered new zone");

        Ok(())
    }

    async fn get_config_value(&self, key: &str) -> Result<Option<String>, FareRuleStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = system_config::table
            .filter(system_config::key.eq(key))
            .select(SystemConfigRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "get_config_value"))?;
        Ok(row.map(|row| row.value))
    }
}
