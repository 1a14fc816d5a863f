//! Port for the shared (cross-instance) fare cache.
//!
//! The shared cache is an optional accelerator, never a source of truth. The
//! resolution facade treats every error from this port as a cache miss, so
//! an unreachable backend degrades the system to rule-store traffic instead
//! of failing requests.

use async_trait::async_trait;

use crate::domain::fare::{Fare, FareRule, ZonePair};

/// Errors surfaced by shared-cache adapters.
///
/// Callers absorb these: they are logged and treated as misses or no-ops,
/// never propagated to the request path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FareCacheError {
    /// Cache backend is unreachable or returned a protocol error.
    #[error("fare cache backend failure: {message}")]
    Backend { message: String },
    /// The bounded operation timeout elapsed.
    #[error("fare cache operation timed out after {millis}ms")]
    Timeout {
        /// Configured operation deadline in milliseconds.
        millis: u64,
    },
}

impl FareCacheError {
    /// Helper for backend-level failures.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Helper for elapsed operation deadlines.
    #[must_use]
    pub const fn timeout(millis: u64) -> Self {
        Self::Timeout { millis }
    }
}

/// Port for the distributed fare cache shared across instances.
///
/// Entries expire through the backend's own TTL mechanism, asserted at write
/// time; `get` never re-checks expiry. Implementations apply a bounded
/// timeout to every network operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SharedFareCache: Send + Sync {
    /// Fetch a cached fare for the normalized pair.
    async fn get(&self, pair: ZonePair) -> Result<Option<Fare>, FareCacheError>;

    /// Store a fare under the normalized pair with the configured TTL.
    async fn set(&self, pair: ZonePair, fare: Fare) -> Result<(), FareCacheError>;

    /// Remove the entry for one normalized pair.
    async fn invalidate(&self, pair: ZonePair) -> Result<(), FareCacheError>;

    /// Remove every fare entry owned by this service.
    async fn invalidate_all(&self) -> Result<(), FareCacheError>;

    /// Bulk-write the full rule table in a single batch.
    ///
    /// Used to pre-warm a cold cache at startup so it does not collapse into
    /// one rule-store read per request.
    async fn warm(&self, rules: Vec<FareRule>) -> Result<(), FareCacheError>;
}

/// No-op cache used when no shared backend is configured.
///
/// Always misses on `get`; writes and invalidations succeed silently. The
/// system stays fully correct by falling through to the rule store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSharedFareCache;

impl NoopSharedFareCache {
    /// Create a new no-op cache instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SharedFareCache for NoopSharedFareCache {
    async fn get(&self, _pair: ZonePair) -> Result<Option<Fare>, FareCacheError> {
        Ok(None)
    }

    async fn set(&self, _pair: ZonePair, _fare: Fare) -> Result<(), FareCacheError> {
        Ok(())
    }

    async fn invalidate(&self, _pair: ZonePair) -> Result<(), FareCacheError> {
        Ok(())
    }

    async fn invalidate_all(&self) -> Result<(), FareCacheError> {
        Ok(())
    }

    async fn warm(&self, _rules: Vec<FareRule>) -> Result<(), FareCacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fare::Zone;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn noop_cache_always_misses() {
        let cache = NoopSharedFareCache::new();
        let pair = ZonePair::new(Zone(1), Zone(2));
        let result = cache.get(pair).await.expect("get succeeds");
        assert!(result.is_none(), "noop cache should always miss");
    }

    #[rstest]
    #[tokio::test]
    async fn noop_cache_writes_succeed() {
        let cache = NoopSharedFareCache::new();
        let pair = ZonePair::new(Zone(1), Zone(2));
        let fare = Fare::new(55.0).expect("valid fare");
        cache.set(pair, fare).await.expect("set succeeds");
        cache.invalidate(pair).await.expect("invalidate succeeds");
        cache.invalidate_all().await.expect("clear succeeds");
    }
}
