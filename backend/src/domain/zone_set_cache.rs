//! Time-boxed cache of the registered zone set.
//!
//! Zone validation runs on every request, so the full zone set is cached
//! alongside a content fingerprint of the rule table it was derived from.
//! The fingerprint lets the resolution facade's reload path detect whether
//! an administrative mutation actually changed the table.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;

use crate::domain::fare::Zone;
use crate::domain::fingerprint::RuleTableFingerprint;

/// Snapshot of the registered zones at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSetSnapshot {
    /// Registered zones, ascending.
    pub zones: Vec<Zone>,
    /// Fingerprint of the rule table the zones were derived from.
    pub fingerprint: RuleTableFingerprint,
    /// When the snapshot was taken.
    pub cached_at: DateTime<Utc>,
}

/// TTL-bounded holder for the current [`ZoneSetSnapshot`].
pub struct ZoneSetCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    snapshot: Mutex<Option<ZoneSetSnapshot>>,
}

impl ZoneSetCache {
    /// Create an empty cache with the given snapshot TTL.
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            snapshot: Mutex::new(None),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ZoneSetSnapshot>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current snapshot, if one exists and is within its TTL.
    pub fn get(&self) -> Option<ZoneSetSnapshot> {
        let now = self.clock.utc();
        let guard = self.lock();
        guard
            .as_ref()
            .filter(|snapshot| now - snapshot.cached_at < self.ttl)
            .cloned()
    }

    /// The fingerprint of the cached snapshot, valid or not.
    ///
    /// Reload uses this to compare against a freshly computed fingerprint
    /// even when the snapshot has aged past its TTL.
    pub fn fingerprint(&self) -> Option<RuleTableFingerprint> {
        self.lock()
            .as_ref()
            .map(|snapshot| snapshot.fingerprint.clone())
    }

    /// Store a snapshot of the zones derived from the given rule table.
    pub fn set(&self, zones: Vec<Zone>, fingerprint: RuleTableFingerprint) {
        let snapshot = ZoneSetSnapshot {
            zones,
            fingerprint,
            cached_at: self.clock.utc(),
        };
        *self.lock() = Some(snapshot);
    }

    /// Drop the cached snapshot, forcing the next validation to re-derive
    /// from the rule store.
    pub fn invalidate(&self) {
        *self.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fare::FareRule;
    use crate::domain::test_clock::ManualClock;
    use rstest::rstest;

    fn fingerprint_of(rules: &[(i32, i32, f64)]) -> RuleTableFingerprint {
        let rules: Vec<FareRule> = rules
            .iter()
            .map(|&(a, b, amount)| FareRule::new(Zone(a), Zone(b), amount).expect("valid rule"))
            .collect();
        RuleTableFingerprint::of(&rules)
    }

    #[rstest]
    fn snapshot_is_served_within_ttl() {
        let clock = Arc::new(ManualClock::default());
        let cache = ZoneSetCache::new(Duration::seconds(300), clock.clone());

        cache.set(vec![Zone(1), Zone(2)], fingerprint_of(&[(1, 2, 55.0)]));
        clock.advance(Duration::seconds(299));

        let snapshot = cache.get().expect("snapshot within ttl");
        assert_eq!(snapshot.zones, vec![Zone(1), Zone(2)]);
    }

    #[rstest]
    fn snapshot_expires_after_ttl() {
        let clock = Arc::new(ManualClock::default());
        let cache = ZoneSetCache::new(Duration::seconds(300), clock.clone());

        cache.set(vec![Zone(1)], fingerprint_of(&[(1, 1, 40.0)]));
        clock.advance(Duration::seconds(300));
        assert!(cache.get().is_none());
    }

    #[rstest]
    fn fingerprint_outlives_ttl_expiry() {
        let clock = Arc::new(ManualClock::default());
        let cache = ZoneSetCache::new(Duration::seconds(300), clock.clone());

        let fingerprint = fingerprint_of(&[(1, 1, 40.0)]);
        cache.set(vec![Zone(1)], fingerprint.clone());
        clock.advance(Duration::seconds(301));

        assert!(cache.get().is_none());
        assert_eq!(cache.fingerprint(), Some(fingerprint));
    }

    #[rstest]
    fn invalidate_clears_snapshot_and_fingerprint() {
        let clock = Arc::new(ManualClock::default());
        let cache = ZoneSetCache::new(Duration::seconds(300), clock);

        cache.set(vec![Zone(1)], fingerprint_of(&[(1, 1, 40.0)]));
        cache.invalidate();
        assert!(cache.get().is_none());
        assert!(cache.fingerprint().is_none());
    }
}
