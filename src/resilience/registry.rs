//! # Circuit Breaker Registry (CGW-131)
//!
//! One breaker per named upstream dependency, created on first use and
//! shared by every caller in the process. Breaker state is process-local by
//! design: instances observe upstream health independently, and a sick
//! instance must not open circuits for healthy ones.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::resilience::circuit_breaker::{
    CircuitBreaker, CircuitBreakerError, CircuitOpenError, CircuitState,
};
use crate::resilience::config::CircuitBreakerPolicy;
use crate::resilience::metrics::CircuitBreakerMetrics;

/// Name-keyed collection of circuit breakers.
///
/// Unknown names get a breaker on first access, using the per-dependency
/// policy override when one is configured and the default policy otherwise.
/// A disabled registry admits every call and records nothing.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    default_policy: CircuitBreakerPolicy,
    overrides: HashMap<String, CircuitBreakerPolicy>,
    enabled: bool,
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerPolicy::default())
    }
}

impl CircuitBreakerRegistry {
    /// Registry where every dependency gets `default_policy`
    pub fn new(default_policy: CircuitBreakerPolicy) -> Self {
        Self {
            breakers: DashMap::new(),
            default_policy,
            overrides: HashMap::new(),
            enabled: true,
        }
    }

    /// Registry with per-dependency policy overrides
    pub fn with_overrides(
        default_policy: CircuitBreakerPolicy,
        overrides: HashMap<String, CircuitBreakerPolicy>,
    ) -> Self {
        Self {
            breakers: DashMap::new(),
            default_policy,
            overrides,
            enabled: true,
        }
    }

    /// Pass-through registry: admits everything, records nothing
    pub fn disabled() -> Self {
        info!("Circuit breakers disabled: all calls admitted");
        Self {
            breakers: DashMap::new(),
            default_policy: CircuitBreakerPolicy::default(),
            overrides: HashMap::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Register (or re-register) a dependency with an explicit policy.
    ///
    /// Idempotent: an existing breaker has its policy swapped in place and
    /// keeps its state, counters, and opened-at timestamp.
    pub fn register_circuit(
        &self,
        name: &str,
        policy: CircuitBreakerPolicy,
    ) -> Arc<CircuitBreaker> {
        match self.breakers.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                entry.get().update_policy(policy);
                entry.get().clone()
            }
            Entry::Vacant(entry) => entry
                .insert(Arc::new(CircuitBreaker::new(name, policy)))
                .clone(),
        }
    }

    /// The breaker guarding `name`, created on first access.
    pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return existing.clone();
        }

        let policy = self.policy_for(name);
        debug!(dependency = name, "Creating circuit breaker on first use");
        // Entry re-checks under the shard lock: concurrent creators converge
        // on a single breaker
        match self.breakers.entry(name.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => entry
                .insert(Arc::new(CircuitBreaker::new(name, policy)))
                .clone(),
        }
    }

    /// May a call to `name` go ahead? See [`CircuitBreaker::can_proceed`]
    /// for trial-slot semantics while half-open.
    pub fn can_proceed(&self, name: &str) -> bool {
        if !self.enabled {
            return true;
        }
        self.breaker(name).can_proceed()
    }

    /// Admission as a `Result` for call sites that propagate with `?`
    pub fn check(&self, name: &str) -> Result<(), CircuitOpenError> {
        if !self.enabled {
            return Ok(());
        }
        self.breaker(name).check()
    }

    /// Record a success against `name`. Never fails.
    pub fn record_success(&self, name: &str) {
        if self.enabled {
            self.breaker(name).record_success();
        }
    }

    /// Record a failure against `name`. Never fails.
    pub fn record_failure(&self, name: &str) {
        if self.enabled {
            self.breaker(name).record_failure();
        }
    }

    /// Current state of `name`, if a breaker exists for it
    pub fn state(&self, name: &str) -> Option<CircuitState> {
        self.breakers.get(name).map(|b| b.state())
    }

    /// Names of every registered dependency
    pub fn dependency_names(&self) -> Vec<String> {
        self.breakers.iter().map(|e| e.key().clone()).collect()
    }

    /// Metrics snapshot of every breaker
    pub fn metrics(&self) -> HashMap<String, CircuitBreakerMetrics> {
        self.breakers
            .iter()
            .map(|e| (e.key().clone(), e.value().metrics()))
            .collect()
    }

    /// Run `operation` under the breaker for `name`; every error counts as
    /// a failure.
    pub async fn guard<F, T, E, Fut>(
        &self,
        name: &str,
        operation: F,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.guard_classified(name, operation, |_| true).await
    }

    /// Run `operation` under the breaker for `name`, with `is_failure`
    /// deciding which errors count toward tripping.
    pub async fn guard_classified<F, T, E, Fut, C>(
        &self,
        name: &str,
        operation: F,
        is_failure: C,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
    {
        if !self.enabled {
            return operation()
                .await
                .map_err(CircuitBreakerError::OperationFailed);
        }
        self.breaker(name).call_classified(operation, is_failure).await
    }

    fn policy_for(&self, name: &str) -> CircuitBreakerPolicy {
        self.overrides
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.default_policy.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_breakers_are_shared_per_name() {
        let registry = CircuitBreakerRegistry::default();

        let a = registry.breaker("indexer");
        let b = registry.breaker("indexer");
        let other = registry.breaker("price-oracle");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
        assert_eq!(registry.dependency_names().len(), 2);
    }

    #[tokio::test]
    async fn test_register_is_idempotent_and_preserves_state() {
        let registry = CircuitBreakerRegistry::default();

        let policy = CircuitBreakerPolicy {
            failure_threshold: 1,
            ..Default::default()
        };
        let breaker = registry.register_circuit("indexer", policy);
        registry.record_failure("indexer");
        assert_eq!(registry.state("indexer"), Some(CircuitState::Open));

        // Re-registering swaps policy without closing the circuit
        let again = registry.register_circuit(
            "indexer",
            CircuitBreakerPolicy {
                failure_threshold: 10,
                ..Default::default()
            },
        );
        assert!(Arc::ptr_eq(&breaker, &again));
        assert_eq!(registry.state("indexer"), Some(CircuitState::Open));
        assert_eq!(again.policy().failure_threshold, 10);
    }

    #[tokio::test]
    async fn test_overrides_apply_on_first_use() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "price-oracle".to_string(),
            CircuitBreakerPolicy::for_price_oracle(),
        );
        let registry =
            CircuitBreakerRegistry::with_overrides(CircuitBreakerPolicy::default(), overrides);

        assert_eq!(registry.breaker("price-oracle").policy().failure_threshold, 3);
        assert_eq!(registry.breaker("indexer").policy().failure_threshold, 5);
    }

    #[tokio::test]
    async fn test_disabled_registry_admits_everything() {
        let registry = CircuitBreakerRegistry::disabled();

        for _ in 0..100 {
            registry.record_failure("indexer");
            assert!(registry.can_proceed("indexer"));
        }
        assert!(registry.check("indexer").is_ok());
        // Nothing was ever created or recorded
        assert!(registry.state("indexer").is_none());
    }

    #[tokio::test]
    async fn test_guard_records_outcomes() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerPolicy {
            failure_threshold: 2,
            open_duration: Duration::from_secs(60),
            ..Default::default()
        });

        let ok: Result<_, CircuitBreakerError<String>> =
            registry.guard("indexer", || async { Ok("fine") }).await;
        assert!(ok.is_ok());

        for _ in 0..2 {
            let _ = registry
                .guard::<_, String, _, _>("indexer", || async { Err("boom".to_string()) })
                .await;
        }
        assert_eq!(registry.state("indexer"), Some(CircuitState::Open));

        let rejected: Result<&str, _> = registry
            .guard::<_, _, String, _>("indexer", || async { Ok("never runs") })
            .await;
        assert!(matches!(
            rejected,
            Err(CircuitBreakerError::CircuitOpen(_))
        ));
    }

    #[tokio::test]
    async fn test_guard_classified_skips_client_errors() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerPolicy {
            failure_threshold: 1,
            ..Default::default()
        });

        let _ = registry
            .guard_classified(
                "indexer",
                || async { Err::<(), _>("missing") },
                |e: &&str| *e != "missing",
            )
            .await;

        assert_eq!(registry.state("indexer"), Some(CircuitState::Closed));
    }
}
