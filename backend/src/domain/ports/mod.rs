//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`FareRuleStore`], [`SharedFareCache`]) describe what the
//! domain needs from adapters; driving ports ([`FareCalculator`],
//! [`ZoneDirectory`], [`FareRuleAdmin`]) describe what the inbound layer may
//! ask of the domain. Each trait exposes strongly typed errors so adapters
//! map failures into predictable variants.

mod fare_calculator;
mod fare_rule_admin;
mod fare_rule_store;
mod shared_fare_cache;
mod zone_directory;

#[cfg(test)]
pub use fare_calculator::MockFareCalculator;
pub use fare_calculator::FareCalculator;
#[cfg(test)]
pub use fare_rule_admin::MockFareRuleAdmin;
pub use fare_rule_admin::{AddZoneOutcome, AddZoneRequest, FareRuleAdmin};
#[cfg(test)]
pub use fare_rule_store::MockFareRuleStore;
pub use fare_rule_store::{
    DEFAULT_MAX_JOURNEYS, FareRuleStore, FareRuleStoreError, FixtureFareRuleStore,
    MAX_JOURNEYS_CONFIG_KEY, default_fare_rules,
};
#[cfg(test)]
pub use shared_fare_cache::MockSharedFareCache;
pub use shared_fare_cache::{FareCacheError, NoopSharedFareCache, SharedFareCache};
#[cfg(test)]
pub use zone_directory::MockZoneDirectory;
pub use zone_directory::ZoneDirectory;
