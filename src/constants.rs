//! # System Constants
//!
//! Operational boundaries and wire-level constants for the ChainGate
//! resilience core. Every value that participates in the shared-backend
//! wire contract (key prefixes, sentinel values, marker formats) lives
//! here so that all gateway instances agree on it.

/// Cache storage boundaries and wire-contract strings
pub mod cache {
    /// Hard ceiling for any TTL accepted by the backend (32-bit seconds).
    /// Applied after jitter, immediately before every expiring write.
    pub const MAX_TTL_SECONDS: u64 = i32::MAX as u64;

    /// Default expiration for cached values when callers do not supply one
    pub const DEFAULT_TTL_SECONDS: u64 = 60;

    /// Default expiration for cached upstream not-found results
    pub const DEFAULT_NOT_FOUND_TTL_SECONDS: u64 = 30;

    /// Default ± percentage applied to value-write TTLs to spread expirations
    pub const DEFAULT_TTL_DEVIATION_PERCENT: u32 = 10;

    /// Key prefix for invalidation markers (`invalidation:<key>`)
    pub const INVALIDATION_KEY_PREFIX: &str = "invalidation:";

    /// Sentinel stored in place of a payload when an upstream reported
    /// not-found. Serialized payloads are always JSON, so a bare token can
    /// never collide with one.
    pub const NOT_FOUND_VALUE: &str = "not_found";

    /// Hash field used when a key holds a single undifferentiated value
    pub const DEFAULT_FIELD: &str = "";
}

/// Circuit breaker state machine defaults
pub mod circuit_breaker {
    /// Consecutive failures that trip a closed circuit open
    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

    /// Consecutive half-open successes required to close a circuit
    pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 2;

    /// How long an open circuit rejects calls before probing (milliseconds)
    pub const DEFAULT_OPEN_DURATION_MS: u64 = 60_000;

    /// Concurrent trial calls admitted while half-open
    pub const DEFAULT_HALF_OPEN_MAX_REQUESTS: u32 = 3;
}

/// Fixed-window rate limiting defaults
pub mod rate_limit {
    /// Requests admitted per client per window when no route override exists
    pub const DEFAULT_MAX_REQUESTS: u32 = 100;

    /// Window length in seconds
    pub const DEFAULT_WINDOW_SECONDS: u64 = 60;

    /// Prefix for per-client window counters
    pub const COUNTER_KEY_PREFIX: &str = "rate_limit:";
}

/// Process environment and lifecycle
pub mod system {
    /// Environment variable naming the active deployment environment
    pub const ENV_VAR: &str = "CHAINGATE_ENV";

    /// Environment assumed when [`ENV_VAR`] is unset
    pub const DEFAULT_ENVIRONMENT: &str = "development";

    /// Default grace period for closing the backend connection (milliseconds)
    pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5_000;

    /// Default backend connection timeout (seconds)
    pub const DEFAULT_CONNECTION_TIMEOUT_SECONDS: u64 = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_ttl_fits_backend_integer() {
        assert_eq!(cache::MAX_TTL_SECONDS, 2_147_483_647);
    }

    #[test]
    fn test_invalidation_prefix_has_separator() {
        assert!(cache::INVALIDATION_KEY_PREFIX.ends_with(':'));
        assert!(rate_limit::COUNTER_KEY_PREFIX.ends_with(':'));
    }

    #[test]
    fn test_not_found_sentinel_is_not_json() {
        assert!(serde_json::from_str::<serde_json::Value>(cache::NOT_FOUND_VALUE).is_err());
    }
}
