//! Redis-backed `SharedFareCache` implementation.
//!
//! Uses `bb8-redis` for connection pooling and namespaced keys
//! (`fare:{lower}:{upper}`) so a whole-table invalidation can target this
//! service's entries alone. Every network operation runs under a bounded
//! timeout; callers treat failures as cache misses, so a slow or absent
//! Redis degrades throughput rather than correctness.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::bb8::Pool;
use bb8_redis::redis::AsyncCommands;
use bb8_redis::{RedisConnectionManager, redis};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::domain::fare::{Fare, FareRule, ZonePair};
use crate::domain::ports::{FareCacheError, SharedFareCache};

/// Key pattern matching every fare entry this service owns.
const FARE_KEY_PATTERN: &str = "fare:*";

/// Batch size hint for SCAN iterations.
const SCAN_COUNT: usize = 100;

/// Configuration for the Redis fare cache.
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    redis_url: String,
    ttl: Duration,
    ttl_jitter: Duration,
    op_timeout: Duration,
    pool_size: u32,
}

impl RedisCacheConfig {
    /// Create a new configuration with the given Redis URL.
    ///
    /// Defaults: one hour TTL, up to 60 seconds of expiry jitter, a 250ms
    /// per-operation deadline, and 8 pooled connections.
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            ttl: Duration::from_secs(3600),
            ttl_jitter: Duration::from_secs(60),
            op_timeout: Duration::from_millis(250),
            pool_size: 8,
        }
    }

    /// Set the entry time-to-live.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the maximum random extension added to each entry's TTL.
    ///
    /// Jitter spreads expiry so a warmed table does not vanish all at once
    /// and stampede the rule store.
    #[must_use]
    pub fn with_ttl_jitter(mut self, jitter: Duration) -> Self {
        self.ttl_jitter = jitter;
        self
    }

    /// Set the per-operation network deadline.
    #[must_use]
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    /// Get the Redis URL.
    pub fn redis_url(&self) -> &str {
        &self.redis_url
    }
}

/// Redis-backed implementation of the `SharedFareCache` port.
#[derive(Clone)]
pub struct RedisFareCache {
    pool: Pool<RedisConnectionManager>,
    ttl: Duration,
    ttl_jitter: Duration,
    op_timeout: Duration,
}

impl RedisFareCache {
    /// Connect to Redis and build the connection pool.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the URL is invalid or the initial
    /// connection fails. Callers that want a fail-soft cache fall back to
    /// the no-op implementation on error.
    pub async fn connect(config: RedisCacheConfig) -> Result<Self, FareCacheError> {
        let manager = RedisConnectionManager::new(config.redis_url.as_str())
            .map_err(|err| FareCacheError::backend(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .build(manager)
            .await
            .map_err(|err| FareCacheError::backend(err.to_string()))?;

        Ok(Self {
            pool,
            ttl: config.ttl,
            ttl_jitter: config.ttl_jitter,
            op_timeout: config.op_timeout,
        })
    }

    /// Run a cache operation under the configured deadline.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, FareCacheError>> + Send,
    ) -> Result<T, FareCacheError> {
        let millis = u64::try_from(self.op_timeout.as_millis()).unwrap_or(u64::MAX);
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| FareCacheError::timeout(millis))?
    }

    /// TTL in seconds with random jitter applied.
    fn jittered_ttl(&self) -> u64 {
        let base = self.ttl.as_secs();
        let jitter = self.ttl_jitter.as_secs();
        if jitter == 0 {
            return base;
        }
        let mut rng = SmallRng::from_entropy();
        base + rng.gen_range(0..=jitter)
    }

    async fn connection(
        &self,
    ) -> Result<bb8_redis::bb8::PooledConnection<'_, RedisConnectionManager>, FareCacheError> {
        self.pool
            .get()
            .await
            .map_err(|err| FareCacheError::backend(err.to_string()))
    }
}

#[async_trait]
impl SharedFareCache for RedisFareCache {
    async fn get(&self, pair: ZonePair) -> Result<Option<Fare>, FareCacheError> {
        let key = pair.cache_key();
        self.bounded(async {
            let mut conn = self.connection().await?;
            let amount: Option<f64> = conn
                .get(&key)
                .await
                .map_err(|err| FareCacheError::backend(err.to_string()))?;
            match amount {
                Some(amount) => Fare::new(amount)
                    .map(Some)
                    .map_err(|reason| FareCacheError::backend(reason.to_string())),
                None => Ok(None),
            }
        })
        .await
    }

    async fn set(&self, pair: ZonePair, fare: Fare) -> Result<(), FareCacheError> {
        let key = pair.cache_key();
        let ttl = self.jittered_ttl();
        self.bounded(async {
            let mut conn = self.connection().await?;
            conn.set_ex::<_, _, ()>(&key, fare.amount(), ttl)
                .await
                .map_err(|err| FareCacheError::backend(err.to_string()))
        })
        .await
    }

    async fn invalidate(&self, pair: ZonePair) -> Result<(), FareCacheError> {
        let key = pair.cache_key();
        self.bounded(async {
            let mut conn = self.connection().await?;
            conn.del::<_, ()>(&key)
                .await
                .map_err(|err| FareCacheError::backend(err.to_string()))
        })
        .await
    }

    async fn invalidate_all(&self) -> Result<(), FareCacheError> {
        self.bounded(async {
            let mut conn = self.connection().await?;

            // Cursor-based SCAN so a large keyspace never blocks the server
            // the way KEYS would.
            let mut keys: Vec<String> = Vec::new();
            let mut cursor: u64 = 0;
            loop {
                let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(FARE_KEY_PATTERN)
                    .arg("COUNT")
                    .arg(SCAN_COUNT)
                    .query_async(&mut *conn)
                    .await
                    .map_err(|err| FareCacheError::backend(err.to_string()))?;
                keys.extend(batch);
                cursor = next;
                if cursor == 0 {
                    break;
                }
            }

            if !keys.is_empty() {
                let removed = keys.len();
                conn.del::<_, ()>(keys)
                    .await
                    .map_err(|err| FareCacheError::backend(err.to_string()))?;
                debug!(removed, "flushed shared fare cache");
            }
            Ok(())
        })
        .await
    }

    async fn warm(&self, rules: Vec<FareRule>) -> Result<(), FareCacheError> {
        if rules.is_empty() {
            return Ok(());
        }
        let entries: Vec<(String, f64, u64)> = rules
            .iter()
            .map(|rule| {
                (
                    rule.pair.cache_key(),
                    rule.fare.amount(),
                    self.jittered_ttl(),
                )
            })
            .collect();

        self.bounded(async {
            let mut conn = self.connection().await?;
            let mut pipe = redis::pipe();
            for (key, amount, ttl) in &entries {
                pipe.set_ex(key, *amount, *ttl).ignore();
            }
            pipe.query_async::<()>(&mut *conn)
                .await
                .map_err(|err| FareCacheError::backend(err.to_string()))?;
            debug!(warmed = entries.len(), "pre-warmed shared fare cache");
            Ok(())
        })
        .await
    }
}
