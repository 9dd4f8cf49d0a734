//! # Cache-First Fetch Orchestration
//!
//! The read path every gateway request takes: consult the shared cache,
//! fall through to the upstream on a miss, and write the result back with a
//! bounded TTL. Upstream not-found answers are cached under a sentinel so
//! repeated probes for missing resources stop hammering the upstream.
//!
//! Writes-back are guarded by the key's invalidation marker: a fetch that
//! started before a deletion must not resurrect the deleted entry, however
//! slow the upstream was.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::cache::errors::{CacheError, CacheResult};
use crate::cache::location::CacheLocation;
use crate::cache::traits::CacheService;
use crate::constants::cache::NOT_FOUND_VALUE;
use crate::upstream::UpstreamError;

/// Failure of a cache-first fetch: either the cache layer or the upstream.
///
/// The two sides never mask each other. A backend outage is visible as
/// `Cache`, an upstream fault as `Upstream`, and a cached not-found is
/// re-raised as the original `UpstreamError::NotFound`.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Upstream(e) if e.is_not_found())
    }
}

/// Cache-first read-through over any [`CacheService`].
#[derive(Debug, Clone)]
pub struct CacheFirstFetcher<S> {
    store: Arc<S>,
}

impl<S: CacheService> CacheFirstFetcher<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the cached value at `location`, or drives `upstream` and
    /// caches its outcome.
    ///
    /// Rust futures are lazy: `upstream` runs only on a cache miss. Callers
    /// that want the upstream call in flight while the cache is consulted
    /// can spawn it first and pass the join handle's future.
    ///
    /// Outcome handling on a miss:
    /// - success: value cached with `ttl_seconds`, then returned
    /// - not-found: sentinel cached with `not_found_ttl_seconds`, error
    ///   re-raised
    /// - any other upstream error: propagated, nothing cached
    ///
    /// A hit on the not-found sentinel re-raises
    /// [`UpstreamError::NotFound`] without touching the upstream.
    pub async fn fetch_or_execute<T, F>(
        &self,
        location: &CacheLocation,
        upstream: F,
        ttl_seconds: u64,
        not_found_ttl_seconds: u64,
    ) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T, UpstreamError>> + Send,
    {
        if let Some(raw) = self.store.get_field(location).await? {
            if raw == NOT_FOUND_VALUE {
                debug!(
                    key = location.key(),
                    field = location.field(),
                    "Cached not-found, skipping upstream"
                );
                return Err(UpstreamError::not_found(location.key()).into());
            }
            let value = serde_json::from_str(&raw).map_err(|e| {
                CacheError::SerializationError(format!(
                    "Corrupt cached payload at {}: {}",
                    location.key(),
                    e
                ))
            })?;
            return Ok(value);
        }

        // Everything at or after this instant outranks our eventual write
        let started_at_ms = chrono::Utc::now().timestamp_millis();

        match upstream.await {
            Ok(value) => {
                let raw = serde_json::to_string(&value).map_err(|e| {
                    CacheError::SerializationError(format!(
                        "Failed to serialize payload for {}: {}",
                        location.key(),
                        e
                    ))
                })?;
                self.write_back(location, &raw, ttl_seconds, started_at_ms)
                    .await?;
                Ok(value)
            }
            Err(e) if e.is_not_found() => {
                self.write_back(location, NOT_FOUND_VALUE, not_found_ttl_seconds, started_at_ms)
                    .await?;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drops `key` with all its fields and stamps its invalidation marker.
    pub async fn invalidate(&self, key: &str) -> Result<u64, FetchError> {
        Ok(self.store.delete_key(key).await?)
    }

    /// Writes back unless the key was invalidated after the fetch began.
    async fn write_back(
        &self,
        location: &CacheLocation,
        raw: &str,
        ttl_seconds: u64,
        started_at_ms: i64,
    ) -> CacheResult<()> {
        if let Some(stamp) = self.store.get_field(&location.marker()).await? {
            let invalidated_mid_fetch = stamp
                .parse::<i64>()
                .map(|deleted_at_ms| deleted_at_ms > started_at_ms)
                .unwrap_or(false);
            if invalidated_mid_fetch {
                debug!(
                    key = location.key(),
                    field = location.field(),
                    "Skipping cache write: key invalidated mid-fetch"
                );
                return Ok(());
            }
        }
        self.store
            .set_field(location, raw, Some(ttl_seconds), None)
            .await
    }
}
