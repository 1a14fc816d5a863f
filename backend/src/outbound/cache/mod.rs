//! Redis cache adapter for the shared fare cache port.
//!
//! The adapter is an accelerator, never a source of truth: the resolution
//! facade absorbs every error from this layer as a cache miss, so the
//! service keeps answering from the rule store when Redis is slow or down.

mod redis_fare_cache;

pub use redis_fare_cache::{RedisCacheConfig, RedisFareCache};
