//! Process-local fare cache.
//!
//! Fastest lookup level: a bounded, time-boxed map from normalized zone pair
//! to fare, scoped to one running instance. Entries expire after the
//! configured TTL and the least-recently-used entry is evicted once the
//! capacity bound is reached. All operations are infallible.
//!
//! This is an explicit cache object with `get`/`set`/`invalidate`, not a
//! memoization wrapper; there is no hidden derived state to clear separately.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;

use crate::domain::fare::{Fare, ZonePair};

struct CacheEntry {
    fare: Fare,
    inserted_at: DateTime<Utc>,
    last_used: u64,
}

struct CacheInner {
    entries: HashMap<ZonePair, CacheEntry>,
    // Monotonic counter ordering recency; cheaper than per-entry timestamps.
    tick: u64,
}

/// Thread-safe in-process cache of recently resolved fares.
///
/// `get` reports a miss for both absent and expired entries; callers cannot
/// distinguish the two. The clock is injected so expiry is deterministic
/// under test.
pub struct LocalFareCache {
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    inner: Mutex<CacheInner>,
}

impl LocalFareCache {
    /// Create a cache with the given entry TTL and capacity bound.
    ///
    /// A zero capacity disables caching entirely: every `set` is dropped.
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            capacity,
            clock,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                tick: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the cached fare for a normalized pair, if present and fresh.
    pub fn get(&self, pair: ZonePair) -> Option<Fare> {
        let now = self.clock.utc();
        let mut inner = self.lock();
        inner.tick += 1;
        let tick = inner.tick;

        match inner.entries.get_mut(&pair) {
            Some(entry) if now - entry.inserted_at < self.ttl => {
                entry.last_used = tick;
                Some(entry.fare)
            }
            Some(_) => {
                // Expired: drop eagerly so capacity is not held by dead entries.
                inner.entries.remove(&pair);
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite the entry for a pair, stamping the current time.
    ///
    /// Evicts the least-recently-used entry when the capacity bound would be
    /// exceeded.
    pub fn set(&self, pair: ZonePair, fare: Fare) {
        if self.capacity == 0 {
            return;
        }
        let now = self.clock.utc();
        let mut inner = self.lock();
        inner.tick += 1;
        let tick = inner.tick;

        if !inner.entries.contains_key(&pair) && inner.entries.len() >= self.capacity {
            if let Some(&victim) = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key)
            {
                inner.entries.remove(&victim);
            }
        }

        inner.entries.insert(
            pair,
            CacheEntry {
                fare,
                inserted_at: now,
                last_used: tick,
            },
        );
    }

    /// Remove the entry for exactly one normalized pair.
    pub fn invalidate(&self, pair: ZonePair) {
        self.lock().entries.remove(&pair);
    }

    /// Remove every entry.
    pub fn invalidate_all(&self) {
        self.lock().entries.clear();
    }

    /// Number of live entries (expired entries may still be counted until
    /// their next read).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache currently holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fare::Zone;
    use crate::domain::test_clock::ManualClock;
    use rstest::rstest;

    fn fare(amount: f64) -> Fare {
        Fare::new(amount).expect("valid fare")
    }

    fn pair(a: i32, b: i32) -> ZonePair {
        ZonePair::new(Zone(a), Zone(b))
    }

    #[rstest]
    fn get_returns_value_within_ttl() {
        let clock = Arc::new(ManualClock::default());
        let cache = LocalFareCache::new(Duration::seconds(60), 100, clock.clone());

        cache.set(pair(1, 2), fare(55.0));
        clock.advance(Duration::seconds(59));
        assert_eq!(cache.get(pair(1, 2)), Some(fare(55.0)));
    }

    #[rstest]
    fn get_reports_miss_after_ttl() {
        let clock = Arc::new(ManualClock::default());
        let cache = LocalFareCache::new(Duration::seconds(60), 100, clock.clone());

        cache.set(pair(1, 2), fare(55.0));
        clock.advance(Duration::seconds(60));
        assert_eq!(cache.get(pair(1, 2)), None);
        // Expired entry was dropped, not merely hidden.
        assert!(cache.is_empty());
    }

    #[rstest]
    fn swapped_endpoints_hit_the_same_entry() {
        let clock = Arc::new(ManualClock::default());
        let cache = LocalFareCache::new(Duration::seconds(60), 100, clock);

        cache.set(ZonePair::new(Zone(2), Zone(1)), fare(55.0));
        assert_eq!(cache.get(ZonePair::new(Zone(1), Zone(2))), Some(fare(55.0)));
    }

    #[rstest]
    fn capacity_evicts_least_recently_used() {
        let clock = Arc::new(ManualClock::default());
        let cache = LocalFareCache::new(Duration::seconds(60), 2, clock);

        cache.set(pair(1, 1), fare(40.0));
        cache.set(pair(1, 2), fare(55.0));
        // Touch (1,1) so (1,2) becomes the eviction victim.
        assert!(cache.get(pair(1, 1)).is_some());
        cache.set(pair(2, 3), fare(45.0));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(pair(1, 2)), None);
        assert_eq!(cache.get(pair(1, 1)), Some(fare(40.0)));
        assert_eq!(cache.get(pair(2, 3)), Some(fare(45.0)));
    }

    #[rstest]
    fn overwriting_does_not_evict() {
        let clock = Arc::new(ManualClock::default());
        let cache = LocalFareCache::new(Duration::seconds(60), 2, clock);

        cache.set(pair(1, 1), fare(40.0));
        cache.set(pair(1, 2), fare(55.0));
        cache.set(pair(1, 2), fare(60.0));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(pair(1, 2)), Some(fare(60.0)));
        assert_eq!(cache.get(pair(1, 1)), Some(fare(40.0)));
    }

    #[rstest]
    fn invalidate_removes_exactly_one_pair() {
        let clock = Arc::new(ManualClock::default());
        let cache = LocalFareCache::new(Duration::seconds(60), 100, clock);

        cache.set(pair(1, 2), fare(55.0));
        cache.set(pair(2, 3), fare(45.0));
        cache.invalidate(ZonePair::new(Zone(2), Zone(1)));

        assert_eq!(cache.get(pair(1, 2)), None);
        assert_eq!(cache.get(pair(2, 3)), Some(fare(45.0)));
    }

    #[rstest]
    fn invalidate_all_clears_everything() {
        let clock = Arc::new(ManualClock::default());
        let cache = LocalFareCache::new(Duration::seconds(60), 100, clock);

        cache.set(pair(1, 2), fare(55.0));
        cache.set(pair(2, 3), fare(45.0));
        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[rstest]
    fn zero_capacity_disables_caching() {
        let clock = Arc::new(ManualClock::default());
        let cache = LocalFareCache::new(Duration::seconds(60), 0, clock);

        cache.set(pair(1, 2), fare(55.0));
        assert_eq!(cache.get(pair(1, 2)), None);
    }
}
