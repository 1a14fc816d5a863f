//! Fare resolution facade.
//!
//! Orchestrates the lookup chain for a zone pair: process-local cache, then
//! the shared cache, then the durable rule store, back-filling the faster
//! levels on the way out. Also owns zone validation through the zone-set
//! cache and the cache lifecycle around administrative mutations.
//!
//! Cache failures are absorbed here: an unreachable shared cache degrades to
//! a miss and the request falls through to the rule store. Only rule-store
//! failures surface, as service-level errors.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::error::Error;
use crate::domain::fare::{Fare, FareRule, Zone, ZonePair};
use crate::domain::fingerprint::RuleTableFingerprint;
use crate::domain::journey::Journey;
use crate::domain::local_cache::LocalFareCache;
use crate::domain::ports::{
    AddZoneOutcome, AddZoneRequest, DEFAULT_MAX_JOURNEYS, FareRuleAdmin, FareRuleStore,
    FareRuleStoreError, MAX_JOURNEYS_CONFIG_KEY, SharedFareCache, ZoneDirectory,
};
use crate::domain::zone_set_cache::{ZoneSetCache, ZoneSetSnapshot};

/// Behaviour when no rule exists for a requested pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingRulePolicy {
    /// Resolve to the zero-fare sentinel; callers decide whether zero is
    /// acceptable. Compatible with the historical behaviour.
    #[default]
    ZeroFare,
    /// Surface a typed not-found error so a missing rule is distinguishable
    /// from a legitimately free journey.
    Reject,
}

/// Facade resolving zone pairs to fares across all cache levels.
///
/// Owns its cache objects explicitly; there is no process-global state. One
/// instance is shared (via `Arc`) for the lifetime of the hosting process.
pub struct FareResolutionService<S> {
    store: Arc<S>,
    local: LocalFareCache,
    shared: Arc<dyn SharedFareCache>,
    zone_set: ZoneSetCache,
    missing_rule_policy: MissingRulePolicy,
}

fn map_store_error(error: FareRuleStoreError) -> Error {
    match error {
        FareRuleStoreError::Connection { message } => {
            Error::service_unavailable(format!("fare rule store unavailable: {message}"))
        }
        FareRuleStoreError::Query { message } => {
            Error::internal(format!("fare rule store error: {message}"))
        }
    }
}

impl<S> FareResolutionService<S>
where
    S: FareRuleStore,
{
    /// Create a facade over the given store and cache levels.
    pub fn new(
        store: Arc<S>,
        local: LocalFareCache,
        shared: Arc<dyn SharedFareCache>,
        zone_set: ZoneSetCache,
        missing_rule_policy: MissingRulePolicy,
    ) -> Self {
        Self {
            store,
            local,
            shared,
            zone_set,
            missing_rule_policy,
        }
    }

    /// Resolve the fare for a pair of zones.
    ///
    /// Lookup order: local cache, shared cache, rule store; the first hit
    /// wins and back-fills the levels above it. Concurrent misses for the
    /// same pair may each read the store; duplicates are tolerated.
    ///
    /// # Errors
    ///
    /// Fails only when the rule store is needed and unreachable, or when the
    /// missing-rule policy is [`MissingRulePolicy::Reject`] and no rule
    /// exists. Shared-cache failures never propagate.
    pub async fn resolve_fare(&self, from: Zone, to: Zone) -> Result<Fare, Error> {
        let pair = ZonePair::new(from, to);

        if let Some(fare) = self.local.get(pair) {
            debug!(%pair, %fare, "fare served from local cache");
            return Ok(fare);
        }

        match self.shared.get(pair).await {
            Ok(Some(fare)) => {
                debug!(%pair, %fare, "fare served from shared cache");
                self.local.set(pair, fare);
                return Ok(fare);
            }
            Ok(None) => {}
            Err(error) => {
                warn!(%pair, %error, "shared cache read failed; treating as miss");
            }
        }

        match self.store.get_fare(pair).await.map_err(map_store_error)? {
            Some(fare) => {
                debug!(%pair, %fare, "fare served from rule store");
                self.local.set(pair, fare);
                if let Err(error) = self.shared.set(pair, fare).await {
                    warn!(%pair, %error, "shared cache back-fill failed");
                }
                Ok(fare)
            }
            None => match self.missing_rule_policy {
                MissingRulePolicy::ZeroFare => {
                    debug!(%pair, "no fare rule found; resolving to zero fare");
                    Ok(Fare::ZERO)
                }
                MissingRulePolicy::Reject => Err(Error::not_found(format!(
                    "no fare rule configured for zones {pair}"
                ))
                .with_details(json!({
                    "fromZone": from.value(),
                    "toZone": to.value(),
                }))),
            },
        }
    }

    /// Current zone-set snapshot, refreshing from the store when the cached
    /// one is absent or stale.
    pub async fn zone_snapshot(&self) -> Result<ZoneSetSnapshot, Error> {
        if let Some(snapshot) = self.zone_set.get() {
            return Ok(snapshot);
        }
        self.refresh_zone_set().await
    }

    async fn refresh_zone_set(&self) -> Result<ZoneSetSnapshot, Error> {
        let zones = self.store.get_zones().await.map_err(map_store_error)?;
        let rules = self.store.get_all_rules().await.map_err(map_store_error)?;
        let fingerprint = RuleTableFingerprint::of(&rules);
        debug!(
            zone_count = zones.len(),
            %fingerprint,
            "zone set refreshed from rule store"
        );
        self.zone_set.set(zones, fingerprint);
        self.zone_set
            .get()
            .ok_or_else(|| Error::internal("zone set cache rejected a fresh snapshot"))
    }

    /// The configured maximum journeys per batch, falling back to the
    /// default when the store holds no (or an unparsable) value.
    pub async fn configured_max_journeys(&self) -> Result<usize, Error> {
        let value = self
            .store
            .get_config_value(MAX_JOURNEYS_CONFIG_KEY)
            .await
            .map_err(map_store_error)?;
        Ok(value
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_JOURNEYS))
    }

    /// Pre-warm the shared cache (and the local cache) from the full rule
    /// table, and prime the zone-set snapshot.
    ///
    /// Called when a process first acquires its shared-cache reference so a
    /// cold cache does not collapse into one store read per request.
    ///
    /// # Errors
    ///
    /// Fails only when the rule table cannot be read; a failing shared-cache
    /// write is logged and ignored.
    pub async fn warm_caches(&self) -> Result<(), Error> {
        let rules = self.store.get_all_rules().await.map_err(map_store_error)?;
        for rule in &rules {
            self.local.set(rule.pair, rule.fare);
        }
        match self.shared.warm(rules.clone()).await {
            Ok(()) => info!(rule_count = rules.len(), "shared cache warmed"),
            Err(error) => warn!(%error, "shared cache warm-up failed; continuing without it"),
        }

        let zones = self.store.get_zones().await.map_err(map_store_error)?;
        self.zone_set.set(zones, RuleTableFingerprint::of(&rules));
        Ok(())
    }

    /// Validate that a batch of journeys is admissible before any fare
    /// resolution: batch size within the configured limit and every zone
    /// registered.
    pub async fn validate_batch(&self, journeys: &[Journey]) -> Result<(), Error> {
        if journeys.is_empty() {
            return Err(Error::invalid_request("at least one journey is required"));
        }

        let limit = self.configured_max_journeys().await?;
        if journeys.len() > limit {
            return Err(Error::invalid_request(format!(
                "maximum {limit} journeys allowed per batch"
            ))
            .with_details(json!({
                "limit": limit,
                "received": journeys.len(),
            })));
        }

        let snapshot = self.zone_snapshot().await?;
        for journey in journeys {
            for zone in [journey.from_zone, journey.to_zone] {
                if snapshot.zones.binary_search(&zone).is_err() {
                    return Err(Error::invalid_request(format!(
                        "zone {zone} is not registered"
                    ))
                    .with_details(json!({
                        "zone": zone.value(),
                        "availableZones": snapshot
                            .zones
                            .iter()
                            .map(|z| z.value())
                            .collect::<Vec<_>>(),
                    })));
                }
            }
        }
        Ok(())
    }

    async fn flush_fare_caches(&self) {
        self.local.invalidate_all();
        if let Err(error) = self.shared.invalidate_all().await {
            warn!(%error, "shared cache flush failed; entries expire via TTL");
        }
    }
}

#[async_trait]
impl<S> ZoneDirectory for FareResolutionService<S>
where
    S: FareRuleStore + 'static,
{
    async fn is_valid_zone(&self, zone: Zone) -> Result<bool, Error> {
        let snapshot = self.zone_snapshot().await?;
        Ok(snapshot.zones.binary_search(&zone).is_ok())
    }

    async fn available_zones(&self) -> Result<Vec<Zone>, Error> {
        Ok(self.zone_snapshot().await?.zones)
    }

    async fn reload_rules(&self) -> Result<(), Error> {
        let rules = self.store.get_all_rules().await.map_err(map_store_error)?;
        let fingerprint = RuleTableFingerprint::of(&rules);

        // Skip the flush when the table content is unchanged; the caches
        // cannot be holding a stale fare in that case.
        let unchanged = self.zone_set.fingerprint() == Some(fingerprint.clone());
        if unchanged {
            debug!(%fingerprint, "rule table unchanged; fare caches kept");
        } else {
            info!(%fingerprint, "rule table changed; flushing fare caches");
            self.flush_fare_caches().await;
        }

        let zones = self.store.get_zones().await.map_err(map_store_error)?;
        self.zone_set.set(zones, fingerprint);
        Ok(())
    }
}

#[async_trait]
impl<S> FareRuleAdmin for FareResolutionService<S>
where
    S: FareRuleStore + 'static,
{
    async fn list_rules(&self) -> Result<Vec<FareRule>, Error> {
        let mut rules = self.store.get_all_rules().await.map_err(map_store_error)?;
        rules.sort_by_key(|rule| rule.pair);
        Ok(rules)
    }

    async fn max_journeys(&self) -> Result<usize, Error> {
        self.configured_max_journeys().await
    }

    async fn upsert_rule(&self, from: Zone, to: Zone, amount: f64) -> Result<FareRule, Error> {
        let snapshot = self.zone_snapshot().await?;
        for zone in [from, to] {
            if snapshot.zones.binary_search(&zone).is_err() {
                return Err(
                    Error::invalid_request(format!("zone {zone} is not registered")).with_details(
                        json!({
                            "zone": zone.value(),
                            "availableZones": snapshot
                                .zones
                                .iter()
                                .map(|z| z.value())
                                .collect::<Vec<_>>(),
                        }),
                    ),
                );
            }
        }

        let rule = FareRule::new(from, to, amount)
            .map_err(|error| Error::invalid_request(error.to_string()))?;

        // Commit durably first; only then touch the caches. The reverse
        // order would let a reader refill a cache with the pre-update value
        // between the invalidation and the write.
        let committed = self
            .store
            .upsert_rule(rule)
            .await
            .map_err(map_store_error)?;
        self.reload_rules().await?;

        info!(pair = %committed.pair, fare = %committed.fare, "fare rule upserted");
        Ok(committed)
    }

    async fn add_zone(&self, request: AddZoneRequest) -> Result<AddZoneOutcome, Error> {
        let snapshot = self.zone_snapshot().await?;
        if snapshot.zones.binary_search(&request.zone).is_ok() {
            return Err(
                Error::conflict(format!("zone {} already exists", request.zone))
                    .with_details(json!({ "zone": request.zone.value() })),
            );
        }
        if !request.fares_to_existing.contains_key(&request.zone) {
            return Err(Error::invalid_request(format!(
                "must provide fare for zone {zone} to zone {zone}",
                zone = request.zone
            )));
        }

        let mut rules = Vec::with_capacity(request.fares_to_existing.len());
        for (&other, &amount) in &request.fares_to_existing {
            let rule = FareRule::new(request.zone, other, amount).map_err(|error| {
                Error::invalid_request(format!("fare to zone {other}: {error}"))
            })?;
            rules.push(rule);
        }

        let rules_added = rules.len();
        self.store
            .add_zone(request.zone, rules)
            .await
            .map_err(map_store_error)?;
        self.reload_rules().await?;

        let total_zones = self.zone_snapshot().await?.zones.len();
        info!(zone = %request.zone, rules_added, total_zones, "zone registered");
        Ok(AddZoneOutcome {
            zone: request.zone,
            rules_added,
            total_zones,
        })
    }
}
