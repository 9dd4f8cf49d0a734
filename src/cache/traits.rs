//! # Cache Service Trait
//!
//! The storage contract of the distributed cache (CGW-112). All gateway
//! instances read and write through this interface against one shared
//! backend, so every implementation must honor the same wire semantics:
//! hash-per-key layout, expiry applied only when a key has none, plain-key
//! counters, and fault-preserving error propagation.
//!
//! Uses `impl Future` in return position rather than `async_trait`: no
//! boxing on the hot path, and `Send` bounds stay explicit.

use std::future::Future;

use crate::cache::errors::CacheResult;
use crate::cache::location::CacheLocation;

/// Async cache storage over a shared backend.
///
/// Implemented by the Redis-backed store and by the in-memory test double.
pub trait CacheService: Send + Sync {
    /// Reads the value at `location`. `Ok(None)` is a miss; backend faults
    /// surface as errors, never as misses.
    fn get_field(
        &self,
        location: &CacheLocation,
    ) -> impl Future<Output = CacheResult<Option<String>>> + Send;

    /// Writes `value` at `location` with an expiration.
    ///
    /// A `ttl_seconds` of `None` or `Some(0)` makes this a no-op: nothing
    /// may enter the shared backend without a bounded lifetime. The
    /// expiration is applied only when the key has none yet, so rewriting
    /// fields never extends the life of an already-expiring key.
    ///
    /// `deviate_percent: None` falls back to the store's configured default
    /// deviation. Counter operations below treat `None` as zero instead;
    /// value writes want spread-out expirations, windows want exact ones.
    fn set_field(
        &self,
        location: &CacheLocation,
        value: &str,
        ttl_seconds: Option<u64>,
        deviate_percent: Option<u32>,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    /// Removes `key` with all its fields and records an invalidation marker
    /// at `invalidation:<key>` holding the deletion time in epoch
    /// milliseconds. Returns the number of keys removed (0 when absent).
    fn delete_key(&self, key: &str) -> impl Future<Output = CacheResult<u64>> + Send;

    /// Atomically increments the plain-key counter at `counter_key`,
    /// creating it at 1, and returns the new value.
    ///
    /// When `ttl_seconds` is given it is applied only if the key has no
    /// expiry yet: the first increment opens the window, later increments
    /// never extend it. `deviate_percent: None` means no deviation.
    fn increment(
        &self,
        counter_key: &str,
        ttl_seconds: Option<u64>,
        deviate_percent: Option<u32>,
    ) -> impl Future<Output = CacheResult<i64>> + Send;

    /// Seeds the counter at `counter_key` to `value` with an expiration,
    /// only if the counter does not already exist (first writer wins).
    /// `deviate_percent: None` means no deviation.
    fn set_counter(
        &self,
        counter_key: &str,
        value: i64,
        ttl_seconds: u64,
        deviate_percent: Option<u32>,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    /// Reads a counter. Missing keys and non-integer payloads both read as
    /// `None`.
    fn get_counter(
        &self,
        counter_key: &str,
    ) -> impl Future<Output = CacheResult<Option<i64>>> + Send;

    /// Liveness probe: one backend round trip must succeed.
    fn ping(&self) -> impl Future<Output = CacheResult<()>> + Send;

    /// Readiness probe. A multiplexed managed connection is ready exactly
    /// when a round trip succeeds, so the default delegates to [`ping`].
    ///
    /// [`ping`]: CacheService::ping
    fn ready(&self) -> impl Future<Output = bool> + Send {
        async { self.ping().await.is_ok() }
    }

    /// Short stable name of the backing implementation, for logs.
    fn provider_name(&self) -> &'static str;
}
