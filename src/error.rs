//! # Gateway Error Aggregate
//!
//! One top-level error for callers driving several subsystems at once. The
//! subsystem errors stay typed and transparent; this layer only adds the
//! stable `kind()` classification that response mapping and structured logs
//! key on.

use thiserror::Error;

use crate::cache::errors::CacheError;
use crate::cache::fetch::FetchError;
use crate::config::ConfigurationError;
use crate::ratelimit::RateLimitError;
use crate::resilience::CircuitOpenError;
use crate::upstream::UpstreamError;

/// Top-level error for gateway request handling
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The shared cache backend failed
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A dependency's circuit rejected the call
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),

    /// The client was rejected by the rate limit check
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),

    /// The upstream dependency answered with a failure
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Configuration could not be loaded or validated
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl GatewayError {
    /// Get the stable machine-readable error kind for response mapping
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Cache(_) => "backend_error",
            GatewayError::CircuitOpen(_) => "circuit_open",
            GatewayError::RateLimit(RateLimitError::InvalidClient { .. }) => "invalid_client",
            GatewayError::RateLimit(RateLimitError::Cache(_)) => "backend_error",
            GatewayError::RateLimit(RateLimitError::Exceeded { .. }) => "rate_limited",
            GatewayError::Upstream(e) if e.is_not_found() => "not_found",
            GatewayError::Upstream(_) => "upstream_error",
            GatewayError::Configuration(_) => "configuration_error",
        }
    }
}

impl From<FetchError> for GatewayError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Cache(e) => GatewayError::Cache(e),
            FetchError::Upstream(e) => GatewayError::Upstream(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitState;

    #[test]
    fn test_kind_classification() {
        let cache: GatewayError = CacheError::ConnectionError("backend down".to_string()).into();
        assert_eq!(cache.kind(), "backend_error");

        let open: GatewayError = CircuitOpenError {
            dependency: "indexer".to_string(),
            state: CircuitState::Open,
        }
        .into();
        assert_eq!(open.kind(), "circuit_open");

        let exceeded: GatewayError = RateLimitError::Exceeded {
            route: "/v1/chains".to_string(),
            method: "GET".to_string(),
            client: "10.0.0.1".to_string(),
            max_requests: 100,
            window_seconds: 60,
            count: 101,
        }
        .into();
        assert_eq!(exceeded.kind(), "rate_limited");

        let invalid: GatewayError = RateLimitError::InvalidClient {
            client: "not-an-ip".to_string(),
        }
        .into();
        assert_eq!(invalid.kind(), "invalid_client");

        let not_found: GatewayError = UpstreamError::not_found("137_chain").into();
        assert_eq!(not_found.kind(), "not_found");

        let upstream: GatewayError = UpstreamError::status(502, "bad gateway").into();
        assert_eq!(upstream.kind(), "upstream_error");

        let config: GatewayError =
            ConfigurationError::validation_error("bad circuit breaker policy").into();
        assert_eq!(config.kind(), "configuration_error");
    }

    #[test]
    fn test_rate_limit_backend_failure_classifies_as_backend() {
        let error: GatewayError =
            RateLimitError::Cache(CacheError::Timeout("5s".to_string())).into();
        assert_eq!(error.kind(), "backend_error");
    }

    #[test]
    fn test_fetch_error_splits_into_sides() {
        let cache_side: GatewayError =
            FetchError::Cache(CacheError::BackendError("HGET failed".to_string())).into();
        assert!(matches!(cache_side, GatewayError::Cache(_)));

        let upstream_side: GatewayError =
            FetchError::Upstream(UpstreamError::Network("connection reset".to_string())).into();
        assert!(matches!(upstream_side, GatewayError::Upstream(_)));
    }

    #[test]
    fn test_display_is_transparent() {
        let error: GatewayError = CircuitOpenError {
            dependency: "price-oracle".to_string(),
            state: CircuitState::Open,
        }
        .into();
        assert_eq!(
            error.to_string(),
            "circuit breaker rejected call to price-oracle (state: open)"
        );
    }
}
