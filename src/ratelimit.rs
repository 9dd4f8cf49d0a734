//! # Rate Limit Guard
//!
//! Fixed-window request limiting per client, enforced through shared
//! counters so every gateway instance draws down one budget. The first
//! request in a window creates the counter with the window TTL; later
//! requests only increment it, so the window always ends on schedule and
//! the budget resets exactly when the counter expires.
//!
//! Client identifiers are IP addresses. Anything that does not parse as
//! one is rejected before a counter is touched, keeping the counter
//! keyspace bounded to real clients.

use std::net::IpAddr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::errors::CacheError;
use crate::cache::router::CacheRouter;
use crate::cache::traits::CacheService;
use crate::config::RateLimitConfig;

/// Rejections and failures of the rate limit check
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// The client spent its request budget for the current window
    #[error(
        "rate limit exceeded for {client} on {method} {route}: request {count} of {max_requests} allowed per {window_seconds}s"
    )]
    Exceeded {
        route: String,
        method: String,
        client: String,
        max_requests: u32,
        window_seconds: u64,
        count: i64,
    },

    /// The client identifier is not an IP address
    #[error("invalid client identifier '{client}': not an IP address")]
    InvalidClient { client: String },

    /// The counter backend failed; the admission decision is the caller's
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Fixed-window rate limiter over any [`CacheService`].
#[derive(Debug, Clone)]
pub struct RateLimitGuard<S> {
    store: Arc<S>,
    config: RateLimitConfig,
}

impl<S: CacheService> RateLimitGuard<S> {
    pub fn new(store: Arc<S>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Checks whether `client_id` may make one more request on
    /// `method route` under an explicit budget.
    ///
    /// Admission increments the shared window counter; a rejected request
    /// still counts (it consumed a check against the shared backend, and
    /// counting it keeps all gateway instances in agreement about when the
    /// window filled up). Malformed client identifiers are rejected without
    /// touching any counter.
    pub async fn allow(
        &self,
        route: &str,
        method: &str,
        client_id: &str,
        max_requests: u32,
        window_seconds: u64,
    ) -> Result<(), RateLimitError> {
        if client_id.parse::<IpAddr>().is_err() {
            warn!(
                client = client_id,
                route, method, "Rejecting request with malformed client identifier"
            );
            return Err(RateLimitError::InvalidClient {
                client: client_id.to_string(),
            });
        }

        let counter_key = CacheRouter::rate_limit_counter(route, method, client_id);

        // Window counters get no TTL deviation: budgets reset on schedule
        let count = self
            .store
            .increment(&counter_key, Some(window_seconds), None)
            .await?;

        if count > i64::from(max_requests) {
            warn!(
                client = client_id,
                route, method, count, max_requests, window_seconds, "Rate limit exceeded"
            );
            return Err(RateLimitError::Exceeded {
                route: route.to_string(),
                method: method.to_string(),
                client: client_id.to_string(),
                max_requests,
                window_seconds,
                count,
            });
        }

        debug!(
            client = client_id,
            route, method, count, max_requests, "Request admitted"
        );
        Ok(())
    }

    /// Same check with the configured budget. Returns immediately when rate
    /// limiting is disabled in configuration.
    pub async fn allow_default(
        &self,
        route: &str,
        method: &str,
        client_id: &str,
    ) -> Result<(), RateLimitError> {
        if !self.config.enabled {
            return Ok(());
        }
        self.allow(
            route,
            method,
            client_id,
            self.config.max_requests,
            self.config.window_seconds,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::InMemoryCacheService;
    use std::time::Duration;

    fn guard(config: RateLimitConfig) -> RateLimitGuard<InMemoryCacheService> {
        RateLimitGuard::new(Arc::new(InMemoryCacheService::new()), config)
    }

    #[tokio::test]
    async fn test_admits_until_budget_spent() {
        let guard = guard(RateLimitConfig::default());

        for _ in 0..3 {
            guard
                .allow("/v1/chains", "GET", "10.0.0.1", 3, 60)
                .await
                .unwrap();
        }

        let error = guard
            .allow("/v1/chains", "GET", "10.0.0.1", 3, 60)
            .await
            .unwrap_err();
        match error {
            RateLimitError::Exceeded {
                count,
                max_requests,
                ..
            } => {
                assert_eq!(count, 4);
                assert_eq!(max_requests, 3);
            }
            other => panic!("expected Exceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_budgets_are_per_client_and_route() {
        let guard = guard(RateLimitConfig::default());

        guard
            .allow("/v1/chains", "GET", "10.0.0.1", 1, 60)
            .await
            .unwrap();

        // A different client and a different route each get a fresh window
        guard
            .allow("/v1/chains", "GET", "10.0.0.2", 1, 60)
            .await
            .unwrap();
        guard
            .allow("/v1/chains", "POST", "10.0.0.1", 1, 60)
            .await
            .unwrap();

        // IPv6 clients are valid identifiers
        guard
            .allow("/v1/chains", "GET", "2001:db8::1", 1, 60)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_client_never_touches_a_counter() {
        let guard = guard(RateLimitConfig::default());

        let error = guard
            .allow("/v1/chains", "GET", "not-an-ip", 3, 60)
            .await
            .unwrap_err();
        assert!(matches!(error, RateLimitError::InvalidClient { .. }));

        let counter_key = CacheRouter::rate_limit_counter("/v1/chains", "GET", "not-an-ip");
        assert_eq!(guard.store.get_counter(&counter_key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_budget() {
        let guard = guard(RateLimitConfig::default());

        guard
            .allow("/v1/balances", "GET", "10.0.0.1", 1, 1)
            .await
            .unwrap();
        assert!(guard
            .allow("/v1/balances", "GET", "10.0.0.1", 1, 1)
            .await
            .is_err());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        guard
            .allow("/v1/balances", "GET", "10.0.0.1", 1, 1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_allow_default_uses_configured_budget() {
        let config = RateLimitConfig {
            enabled: true,
            max_requests: 2,
            window_seconds: 60,
        };
        let guard = guard(config);

        guard
            .allow_default("/v1/chains", "GET", "10.0.0.1")
            .await
            .unwrap();
        guard
            .allow_default("/v1/chains", "GET", "10.0.0.1")
            .await
            .unwrap();

        let error = guard
            .allow_default("/v1/chains", "GET", "10.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            RateLimitError::Exceeded {
                max_requests: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_disabled_guard_admits_everything() {
        let config = RateLimitConfig {
            enabled: false,
            max_requests: 1,
            window_seconds: 60,
        };
        let guard = guard(config);

        // Even malformed clients pass when the guard is off
        for _ in 0..5 {
            guard
                .allow_default("/v1/chains", "GET", "not-an-ip")
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let guard = guard(RateLimitConfig::default());
        guard.store.set_failing(true);

        let error = guard
            .allow("/v1/chains", "GET", "10.0.0.1", 3, 60)
            .await
            .unwrap_err();
        assert!(matches!(error, RateLimitError::Cache(_)));
    }
}
