//! # ChainGate Configuration System
//!
//! This module provides configuration management for the gateway resilience
//! core. All tunable behavior lives in YAML files with environment-specific
//! override sections, validated at load time rather than failing lazily at
//! first use.
//!
//! ## Architecture
//!
//! - **Single Source of Truth**: All configuration comes from YAML files
//! - **Environment Awareness**: Supports development/test/production overrides
//! - **Explicit Validation**: No silent fallbacks or data corruption
//! - **Constant-Backed Defaults**: Every field defaults to the values in [`crate::constants`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chaingate_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration (environment auto-detected)
//! let manager = ConfigManager::load()?;
//!
//! // Access configuration values
//! let redis_url = &manager.config().redis.url;
//! let window = manager.config().rate_limit.window();
//! let policy = manager.config().circuit_breakers.policy_for("indexer");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::constants::{cache, circuit_breaker, rate_limit, system};
use crate::resilience::{CircuitBreakerPolicy, CircuitBreakerRegistry};

/// Root configuration structure mirroring chaingate-config.yaml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Redis connection and key namespacing configuration
    pub redis: RedisConfig,

    /// Cache TTL and jitter configuration
    pub cache: CacheConfig,

    /// Per-client request rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Circuit breaker policies for upstream dependencies
    pub circuit_breakers: CircuitBreakerSettings,
}

impl GatewayConfig {
    /// Validate configuration for consistency and required fields
    pub fn validate(&self) -> ConfigResult<()> {
        self.redis.validate()?;
        self.cache.validate()?;
        self.rate_limit.validate()?;
        self.circuit_breakers.validate()?;
        Ok(())
    }
}

/// Redis connection and key namespacing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Connection URL (`redis://`, `rediss://`, or `unix://`)
    pub url: String,

    /// Optional namespace prepended to every key this process touches.
    /// Lets several deployments share one Redis without collisions.
    pub key_prefix: Option<String>,

    /// How long to wait for the initial connection before giving up
    pub connection_timeout_seconds: u64,

    /// How long shutdown waits for the connection to close cleanly
    pub shutdown_grace_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: None,
            connection_timeout_seconds: system::DEFAULT_CONNECTION_TIMEOUT_SECONDS,
            shutdown_grace_ms: system::DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }
}

impl RedisConfig {
    /// Get connection timeout as Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }

    /// Get shutdown grace period as Duration
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.url.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "redis.url",
                "redis configuration",
            ));
        }

        if !["redis://", "rediss://", "unix://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
        {
            return Err(ConfigurationError::invalid_value(
                "redis.url",
                &self.url,
                "URL must use the redis://, rediss://, or unix:// scheme",
            ));
        }

        if self.connection_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "redis.connection_timeout_seconds",
                "0",
                "connection timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Cache TTL and jitter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied to cached values when the caller does not supply one
    pub default_ttl_seconds: u64,

    /// TTL applied to cached not-found markers. Shorter than the value TTL
    /// so newly created resources become visible quickly.
    pub not_found_ttl_seconds: u64,

    /// Maximum percentage by which TTLs are randomly deviated to spread
    /// out expirations (0 disables jitter)
    pub ttl_deviation_percent: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: cache::DEFAULT_TTL_SECONDS,
            not_found_ttl_seconds: cache::DEFAULT_NOT_FOUND_TTL_SECONDS,
            ttl_deviation_percent: cache::DEFAULT_TTL_DEVIATION_PERCENT,
        }
    }
}

impl CacheConfig {
    /// Get default value TTL as Duration
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    /// Get not-found marker TTL as Duration
    pub fn not_found_ttl(&self) -> Duration {
        Duration::from_secs(self.not_found_ttl_seconds)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.default_ttl_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "cache.default_ttl_seconds",
                "0",
                "TTL must be greater than 0",
            ));
        }

        if self.default_ttl_seconds > cache::MAX_TTL_SECONDS {
            return Err(ConfigurationError::invalid_value(
                "cache.default_ttl_seconds",
                self.default_ttl_seconds.to_string(),
                format!("TTL cannot exceed {} seconds", cache::MAX_TTL_SECONDS),
            ));
        }

        if self.not_found_ttl_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "cache.not_found_ttl_seconds",
                "0",
                "TTL must be greater than 0",
            ));
        }

        if self.ttl_deviation_percent > 100 {
            return Err(ConfigurationError::invalid_value(
                "cache.ttl_deviation_percent",
                self.ttl_deviation_percent.to_string(),
                "deviation percentage cannot exceed 100",
            ));
        }

        Ok(())
    }
}

/// Per-client request rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enforced at all
    pub enabled: bool,

    /// Maximum requests a single client may make per window
    pub max_requests: u32,

    /// Length of the fixed counting window in seconds
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: rate_limit::DEFAULT_MAX_REQUESTS,
            window_seconds: rate_limit::DEFAULT_WINDOW_SECONDS,
        }
    }
}

impl RateLimitConfig {
    /// Get the counting window as Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_requests == 0 {
            return Err(ConfigurationError::invalid_value(
                "rate_limit.max_requests",
                "0",
                "request budget must be greater than 0",
            ));
        }

        if self.window_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "rate_limit.window_seconds",
                "0",
                "window must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Circuit breaker policies for upstream dependencies
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Whether circuit breakers are enabled globally
    pub enabled: bool,

    /// Default policy for dependencies without a specific entry
    pub default_policy: CircuitBreakerPolicyConfig,

    /// Per-dependency policy overrides, keyed by dependency name
    pub dependency_policies: HashMap<String, CircuitBreakerPolicyConfig>,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_policy: CircuitBreakerPolicyConfig::default(),
            dependency_policies: HashMap::new(),
        }
    }
}

impl CircuitBreakerSettings {
    /// Get the policy for a specific dependency, falling back to the default
    pub fn policy_for(&self, dependency_name: &str) -> CircuitBreakerPolicyConfig {
        self.dependency_policies
            .get(dependency_name)
            .cloned()
            .unwrap_or_else(|| self.default_policy.clone())
    }

    /// Build a breaker registry reflecting these settings
    pub fn to_registry(&self) -> CircuitBreakerRegistry {
        if !self.enabled {
            return CircuitBreakerRegistry::disabled();
        }

        let overrides = self
            .dependency_policies
            .iter()
            .map(|(name, policy)| (name.clone(), policy.to_policy()))
            .collect();

        CircuitBreakerRegistry::with_overrides(self.default_policy.to_policy(), overrides)
    }

    fn validate(&self) -> ConfigResult<()> {
        self.default_policy
            .to_policy()
            .validate()
            .map_err(|error| {
                ConfigurationError::validation_error(format!(
                    "circuit_breakers.default_policy: {error}"
                ))
            })?;

        for (name, policy) in &self.dependency_policies {
            policy.to_policy().validate().map_err(|error| {
                ConfigurationError::validation_error(format!(
                    "circuit_breakers.dependency_policies.{name}: {error}"
                ))
            })?;
        }

        Ok(())
    }
}

/// Circuit breaker policy for a single dependency from YAML
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerPolicyConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,

    /// Successful trial calls required to close from half-open
    pub success_threshold: u32,

    /// How long the circuit stays open before admitting trial calls (in milliseconds)
    pub open_duration_ms: u64,

    /// Concurrent trial calls admitted while half-open
    pub half_open_max_requests: u32,
}

impl Default for CircuitBreakerPolicyConfig {
    fn default() -> Self {
        Self {
            failure_threshold: circuit_breaker::DEFAULT_FAILURE_THRESHOLD,
            success_threshold: circuit_breaker::DEFAULT_SUCCESS_THRESHOLD,
            open_duration_ms: circuit_breaker::DEFAULT_OPEN_DURATION_MS,
            half_open_max_requests: circuit_breaker::DEFAULT_HALF_OPEN_MAX_REQUESTS,
        }
    }
}

impl CircuitBreakerPolicyConfig {
    /// Convert to the resilience module's format
    pub fn to_policy(&self) -> CircuitBreakerPolicy {
        CircuitBreakerPolicy {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            open_duration: Duration::from_millis(self.open_duration_ms),
            half_open_max_requests: self.half_open_max_requests,
        }
    }
}
