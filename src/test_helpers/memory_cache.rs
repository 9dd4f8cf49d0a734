//! In-memory implementation of [`CacheService`].
//!
//! Mirrors the wire semantics of the Redis-backed store closely enough that
//! the fetch orchestrator, rate limit guard, and scenario tests exercise the
//! same contract against it: writes without a TTL are dropped, expirations
//! attach only to keys that have none yet, counters are plain signed
//! integers, and deleting a key leaves an invalidation marker behind.
//!
//! Two deliberate simplifications keep tests deterministic: the default TTL
//! deviation is zero (production spreads expirations to avoid stampedes,
//! tests want exact ones), and expired entries are purged lazily at the
//! start of each operation instead of by a background sweeper.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::cache::errors::{CacheError, CacheResult};
use crate::cache::location::CacheLocation;
use crate::cache::traits::CacheService;
use crate::cache::ttl::effective_ttl;
use crate::constants::cache::DEFAULT_TTL_SECONDS;

/// Process-local cache service for tests and single-instance development.
///
/// Interior mutability keeps the surface identical to the shared-backend
/// store: methods take `&self` and the service is freely cloneable behind an
/// `Arc`. [`set_failing`] flips every subsequent operation into a backend
/// error so callers can assert fault propagation.
///
/// [`set_failing`]: InMemoryCacheService::set_failing
#[derive(Debug, Default)]
pub struct InMemoryCacheService {
    inner: Mutex<Inner>,
    failing: AtomicBool,
}

#[derive(Debug, Default)]
struct Inner {
    /// Hash keys: key -> field -> value.
    hashes: HashMap<String, HashMap<String, String>>,
    /// Plain counter keys. A key lives in one map or the other, never both.
    strings: HashMap<String, String>,
    /// Expiration deadlines, shared by both key kinds.
    expirations: HashMap<String, Instant>,
}

impl Inner {
    /// Drops every key whose deadline has passed.
    fn purge_expired(&mut self) {
        let now = Instant::now();
        let expired: Vec<String> = self
            .expirations
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.hashes.remove(&key);
            self.strings.remove(&key);
            self.expirations.remove(&key);
        }
    }

    /// Attaches an expiry only when the key has none, matching `EXPIRE NX`:
    /// the first write opens the window, later writes never extend it.
    fn attach_expiry_nx(&mut self, key: &str, ttl_seconds: u64) {
        if !self.expirations.contains_key(key) {
            self.expirations
                .insert(key.to_owned(), Instant::now() + Duration::from_secs(ttl_seconds));
        }
    }
}

impl InMemoryCacheService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects (or clears) a simulated backend outage. While failing, every
    /// operation returns `CacheError::BackendError`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> CacheResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::BackendError(
                "injected backend failure".to_string(),
            ));
        }
        Ok(())
    }
}

impl CacheService for InMemoryCacheService {
    async fn get_field(&self, location: &CacheLocation) -> CacheResult<Option<String>> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        inner.purge_expired();
        Ok(inner
            .hashes
            .get(location.key())
            .and_then(|fields| fields.get(location.field()))
            .cloned())
    }

    async fn set_field(
        &self,
        location: &CacheLocation,
        value: &str,
        ttl_seconds: Option<u64>,
        deviate_percent: Option<u32>,
    ) -> CacheResult<()> {
        self.check_available()?;
        let Some(ttl) = ttl_seconds.filter(|t| *t > 0) else {
            // Nothing enters the cache without a bounded lifetime
            return Ok(());
        };

        let ttl = effective_ttl(ttl, deviate_percent.unwrap_or(0));
        let mut inner = self.inner.lock();
        inner.purge_expired();
        inner
            .hashes
            .entry(location.key().to_owned())
            .or_default()
            .insert(location.field().to_owned(), value.to_owned());
        inner.attach_expiry_nx(location.key(), ttl);
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> CacheResult<u64> {
        self.check_available()?;
        let removed = {
            let mut inner = self.inner.lock();
            inner.purge_expired();
            let had_hash = inner.hashes.remove(key).is_some();
            let had_string = inner.strings.remove(key).is_some();
            inner.expirations.remove(key);
            u64::from(had_hash || had_string)
        };

        // The marker is written even when nothing was removed: an in-flight
        // reader may be about to write the value this deletion targets.
        let marker = CacheLocation::invalidation_marker(key);
        let stamp = chrono::Utc::now().timestamp_millis().to_string();
        self.set_field(&marker, &stamp, Some(DEFAULT_TTL_SECONDS), Some(0))
            .await?;

        Ok(removed)
    }

    async fn increment(
        &self,
        counter_key: &str,
        ttl_seconds: Option<u64>,
        deviate_percent: Option<u32>,
    ) -> CacheResult<i64> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        inner.purge_expired();

        let count = match inner.strings.get(counter_key) {
            Some(raw) => {
                let current: i64 = raw.parse().map_err(|_| {
                    CacheError::BackendError(format!(
                        "counter {} holds a non-integer value",
                        counter_key
                    ))
                })?;
                current + 1
            }
            None => 1,
        };
        inner
            .strings
            .insert(counter_key.to_owned(), count.to_string());

        if let Some(ttl) = ttl_seconds.filter(|t| *t > 0) {
            let ttl = effective_ttl(ttl, deviate_percent.unwrap_or(0));
            inner.attach_expiry_nx(counter_key, ttl);
        }

        Ok(count)
    }

    async fn set_counter(
        &self,
        counter_key: &str,
        value: i64,
        ttl_seconds: u64,
        deviate_percent: Option<u32>,
    ) -> CacheResult<()> {
        self.check_available()?;
        let ttl = effective_ttl(ttl_seconds, deviate_percent.unwrap_or(0));
        let mut inner = self.inner.lock();
        inner.purge_expired();

        // NX: seeding never clobbers a concurrently created counter
        if inner.strings.contains_key(counter_key) {
            return Ok(());
        }
        inner
            .strings
            .insert(counter_key.to_owned(), value.to_string());
        inner.expirations.insert(
            counter_key.to_owned(),
            Instant::now() + Duration::from_secs(ttl),
        );
        Ok(())
    }

    async fn get_counter(&self, counter_key: &str) -> CacheResult<Option<i64>> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        inner.purge_expired();

        // Missing and non-numeric both read as absent
        Ok(inner
            .strings
            .get(counter_key)
            .and_then(|v| v.parse::<i64>().ok()))
    }

    async fn ping(&self) -> CacheResult<()> {
        self.check_available()
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
