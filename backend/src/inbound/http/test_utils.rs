//! Shared helpers for HTTP handler tests.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::ports::{FixtureFareRuleStore, NoopSharedFareCache};
use crate::domain::test_clock::ManualClock;
use crate::domain::{FareResolutionService, LocalFareCache, MissingRulePolicy, ZoneSetCache};

use super::state::HttpState;

/// Handler state over the seeded in-memory store, no shared cache.
pub(crate) fn fixture_state() -> HttpState {
    fixture_state_with(Arc::new(FixtureFareRuleStore::seeded()))
}

/// Handler state over the provided in-memory store.
pub(crate) fn fixture_state_with(store: Arc<FixtureFareRuleStore>) -> HttpState {
    let clock: Arc<dyn mockable::Clock> = Arc::new(ManualClock::default());
    let facade = Arc::new(FareResolutionService::new(
        store,
        LocalFareCache::new(Duration::seconds(3600), 1000, Arc::clone(&clock)),
        Arc::new(NoopSharedFareCache),
        ZoneSetCache::new(Duration::seconds(300), clock),
        MissingRulePolicy::ZeroFare,
    ));
    HttpState::from_facade(facade)
}
