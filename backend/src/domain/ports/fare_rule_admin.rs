//! Driving port for administrative rule maintenance.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::error::Error;
use crate::domain::fare::{FareRule, Zone};

/// Request to register a new zone with fares to every existing zone.
#[derive(Debug, Clone, PartialEq)]
pub struct AddZoneRequest {
    /// The zone being registered.
    pub zone: Zone,
    /// Fare from the new zone to each existing zone, plus the self-fare.
    pub fares_to_existing: BTreeMap<Zone, f64>,
}

/// Summary returned after a zone registration commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddZoneOutcome {
    /// The newly registered zone.
    pub zone: Zone,
    /// Number of fare rules inserted alongside the zone.
    pub rules_added: usize,
    /// Zone count after the registration.
    pub total_zones: usize,
}

/// Driving port for rule inspection and mutation by administrators.
///
/// Mutations commit durably first and invalidate caches second; the facade
/// enforces that ordering so a reader can never refill a cache with the
/// pre-update value after the invalidation ran.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FareRuleAdmin: Send + Sync {
    /// The full rule table in normalized-pair order.
    async fn list_rules(&self) -> Result<Vec<FareRule>, Error>;

    /// The configured maximum journeys accepted per batch.
    async fn max_journeys(&self) -> Result<usize, Error>;

    /// Insert or overwrite the rule for a zone pair.
    ///
    /// Both zones must already be registered; the amount must be strictly
    /// positive.
    async fn upsert_rule(&self, from: Zone, to: Zone, amount: f64) -> Result<FareRule, Error>;

    /// Register a new zone together with its fare rules.
    ///
    /// Rejects zones that already exist and requests missing the self-fare.
    async fn add_zone(&self, request: AddZoneRequest) -> Result<AddZoneOutcome, Error>;
}
