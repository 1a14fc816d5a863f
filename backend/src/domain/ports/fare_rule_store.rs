//! Port for the durable fare-rule store.
//!
//! The store is the single writer-of-record for fare rules and the small
//! key/value configuration table. Cache levels hold disposable copies only;
//! every mutation goes through this port and is followed by cache
//! invalidation (never the reverse order).

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::fare::{Fare, FareRule, Zone, ZonePair};

/// Errors surfaced by rule-store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FareRuleStoreError {
    /// Store connectivity or pool checkout failures.
    #[error("fare rule store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("fare rule store query failed: {message}")]
    Query { message: String },
}

impl FareRuleStoreError {
    /// Helper for connection-level adapter errors.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Port for durable fare-rule and configuration storage.
///
/// Lookups are direction-independent: `get_fare` must find a rule stored
/// under either endpoint order. Adapters that persist rows in arbitrary order
/// try the exact ordering first and fall back to the reversed pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FareRuleStore: Send + Sync {
    /// Fetch the fare for a zone pair, trying both endpoint orderings.
    ///
    /// Returns `None` when no rule exists for the pair.
    async fn get_fare(&self, pair: ZonePair) -> Result<Option<Fare>, FareRuleStoreError>;

    /// Fetch the full rule table keyed by normalized pair.
    async fn get_all_rules(&self) -> Result<Vec<FareRule>, FareRuleStoreError>;

    /// Enumerate every zone referenced by at least one rule, ascending.
    async fn get_zones(&self) -> Result<Vec<Zone>, FareRuleStoreError>;

    /// Insert or overwrite the rule for a normalized pair.
    ///
    /// Upsert semantics: an existing rule for the same pair is superseded,
    /// never partially deleted.
    async fn upsert_rule(&self, rule: FareRule) -> Result<FareRule, FareRuleStoreError>;

    /// Register a new zone by inserting its fare rules to existing zones
    /// (including the self-fare) in one committed batch.
    async fn add_zone(&self, zone: Zone, rules: Vec<FareRule>) -> Result<(), FareRuleStoreError>;

    /// Read a flat configuration value by key.
    async fn get_config_value(&self, key: &str) -> Result<Option<String>, FareRuleStoreError>;
}

/// In-memory rule store used when no database is configured and by tests.
///
/// Seeded with the default rule table so a fresh process answers fare
/// requests immediately. Rows keep the endpoint orientation they were
/// written with, as a database would, so lookups go through the same
/// exact-then-reversed fallback as the durable adapter. All operations are
/// infallible; the fixture never simulates outages (use the mock for that).
#[derive(Debug)]
pub struct FixtureFareRuleStore {
    rules: Mutex<BTreeMap<(i32, i32), Fare>>,
    config: Mutex<BTreeMap<String, String>>,
}

/// Configuration key holding the maximum journeys accepted per batch.
pub const MAX_JOURNEYS_CONFIG_KEY: &str = "max_journeys_per_batch";

/// Default batch ceiling applied when the store holds no explicit value.
pub const DEFAULT_MAX_JOURNEYS: usize = 20;

/// Default rule table seeded into empty stores: three zones with fares for
/// every unordered pair.
#[must_use]
pub fn default_fare_rules() -> Vec<FareRule> {
    [
        (1, 1, 40.0),
        (1, 2, 55.0),
        (1, 3, 65.0),
        (2, 2, 35.0),
        (2, 3, 45.0),
        (3, 3, 30.0),
    ]
    .into_iter()
    .filter_map(|(a, b, amount)| FareRule::new(Zone(a), Zone(b), amount).ok())
    .collect()
}

impl FixtureFareRuleStore {
    /// Create an empty fixture store.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: Mutex::new(BTreeMap::new()),
            config: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a fixture store seeded with the default rule table.
    #[must_use]
    pub fn seeded() -> Self {
        let store = Self::empty();
        store.load(default_fare_rules());
        store
            .config
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(
                MAX_JOURNEYS_CONFIG_KEY.to_owned(),
                DEFAULT_MAX_JOURNEYS.to_string(),
            );
        store
    }

    /// Replace the rule table with the provided rules.
    pub fn load(&self, rules: Vec<FareRule>) {
        let mut table = self
            .rules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        table.clear();
        for rule in rules {
            table.insert(normalized_key(rule.pair), rule.fare);
        }
    }

    /// Store a row under the given endpoint orientation without normalizing.
    ///
    /// Stands in for rows written before pair normalization; `get_fare` must
    /// still reach them through the reversed fallback.
    pub fn store_raw_row(&self, from_zone: Zone, to_zone: Zone, fare: Fare) {
        self.rules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert((from_zone.value(), to_zone.value()), fare);
    }

    /// Set a configuration value, replacing any existing entry.
    pub fn set_config_value(&self, key: impl Into<String>, value: impl Into<String>) {
        self.config
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.into(), value.into());
    }
}

impl Default for FixtureFareRuleStore {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Canonical storage key for a normalized pair.
fn normalized_key(pair: ZonePair) -> (i32, i32) {
    (pair.lower().value(), pair.upper().value())
}

#[async_trait]
impl FareRuleStore for FixtureFareRuleStore {
    async fn get_fare(&self, pair: ZonePair) -> Result<Option<Fare>, FareRuleStoreError> {
        let table = self
            .rules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let (lower, upper) = normalized_key(pair);
        Ok(table
            .get(&(lower, upper))
            .or_else(|| table.get(&(upper, lower)))
            .copied())
    }

    async fn get_all_rules(&self) -> Result<Vec<FareRule>, FareRuleStoreError> {
        let table = self
            .rules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // Keyed by normalized pair so a legacy reversed duplicate collapses
        // into one rule.
        let normalized: BTreeMap<ZonePair, Fare> = table
            .iter()
            .map(|(&(from, to), &fare)| (ZonePair::new(Zone(from), Zone(to)), fare))
            .collect();
        Ok(normalized
            .into_iter()
            .map(|(pair, fare)| FareRule { pair, fare })
            .collect())
    }

    async fn get_zones(&self) -> Result<Vec<Zone>, FareRuleStoreError> {
        let table = self
            .rules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut zones: Vec<Zone> = table
            .keys()
            .flat_map(|&(from, to)| [Zone(from), Zone(to)])
            .collect();
        zones.sort_unstable();
        zones.dedup();
        Ok(zones)
    }

    async fn upsert_rule(&self, rule: FareRule) -> Result<FareRule, FareRuleStoreError> {
        let mut table = self
            .rules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let (lower, upper) = normalized_key(rule.pair);
        // Retire any legacy reversed row so the pair stays canonical.
        if lower != upper {
            table.remove(&(upper, lower));
        }
        table.insert((lower, upper), rule.fare);
        Ok(rule)
    }

    async fn add_zone(&self, _zone: Zone, rules: Vec<FareRule>) -> Result<(), FareRuleStoreError> {
        let mut table = self
            .rules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for rule in rules {
            table.insert(normalized_key(rule.pair), rule.fare);
        }
        Ok(())
    }

    async fn get_config_value(&self, key: &str) -> Result<Option<String>, FareRuleStoreError> {
        let config = self
            .config
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(config.get(key).cloned())
    }
}
