//! Circuit breaker policy definitions and validation.

use std::time::Duration;

use crate::constants::circuit_breaker::{
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_HALF_OPEN_MAX_REQUESTS, DEFAULT_OPEN_DURATION_MS,
    DEFAULT_SUCCESS_THRESHOLD,
};

/// Tunable behavior of a single circuit breaker.
///
/// One policy per protected dependency; re-registering a dependency swaps
/// its policy in place without resetting breaker state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerPolicy {
    /// Consecutive failures that trip a closed circuit open
    pub failure_threshold: u32,

    /// Consecutive half-open successes required to close the circuit
    pub success_threshold: u32,

    /// How long the circuit rejects calls after opening
    pub open_duration: Duration,

    /// Concurrent trial calls admitted while half-open
    pub half_open_max_requests: u32,
}

impl Default for CircuitBreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            open_duration: Duration::from_millis(DEFAULT_OPEN_DURATION_MS),
            half_open_max_requests: DEFAULT_HALF_OPEN_MAX_REQUESTS,
        }
    }
}

impl CircuitBreakerPolicy {
    /// Policy for chain indexers: slow but usually reliable; give them a
    /// short open window so healthy shards come back quickly.
    pub fn for_indexer() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            open_duration: Duration::from_secs(30),
            half_open_max_requests: 3,
        }
    }

    /// Policy for price oracles: stale prices are worse than missing ones,
    /// so trip early and probe aggressively.
    pub fn for_price_oracle() -> Self {
        Self {
            failure_threshold: 3,
            success_threshold: 1,
            open_duration: Duration::from_secs(15),
            half_open_max_requests: 2,
        }
    }

    /// Policy for the chain config service: near-static data, long cache
    /// coverage; tolerate more failures and probe gently.
    pub fn for_config_service() -> Self {
        Self {
            failure_threshold: 8,
            success_threshold: 2,
            open_duration: Duration::from_secs(120),
            half_open_max_requests: 1,
        }
    }

    /// Validate policy values are within operational bounds
    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be at least 1".to_string());
        }
        if self.failure_threshold > 1000 {
            return Err(format!(
                "failure_threshold {} exceeds maximum of 1000",
                self.failure_threshold
            ));
        }
        if self.success_threshold == 0 {
            return Err("success_threshold must be at least 1".to_string());
        }
        if self.success_threshold > 100 {
            return Err(format!(
                "success_threshold {} exceeds maximum of 100",
                self.success_threshold
            ));
        }
        // Zero is allowed: the circuit then probes on the first check after opening
        if self.open_duration > Duration::from_secs(3600) {
            return Err(format!(
                "open_duration {}s exceeds maximum of 3600s",
                self.open_duration.as_secs()
            ));
        }
        if self.half_open_max_requests == 0 {
            return Err("half_open_max_requests must be at least 1".to_string());
        }
        if self.half_open_max_requests > 100 {
            return Err(format!(
                "half_open_max_requests {} exceeds maximum of 100",
                self.half_open_max_requests
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = CircuitBreakerPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.failure_threshold, 5);
        assert_eq!(policy.success_threshold, 2);
        assert_eq!(policy.open_duration, Duration::from_secs(60));
        assert_eq!(policy.half_open_max_requests, 3);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(CircuitBreakerPolicy::for_indexer().validate().is_ok());
        assert!(CircuitBreakerPolicy::for_price_oracle().validate().is_ok());
        assert!(CircuitBreakerPolicy::for_config_service().validate().is_ok());
    }

    #[test]
    fn test_zero_thresholds_rejected() {
        let mut policy = CircuitBreakerPolicy::default();
        policy.failure_threshold = 0;
        assert!(policy.validate().is_err());

        let mut policy = CircuitBreakerPolicy::default();
        policy.success_threshold = 0;
        assert!(policy.validate().is_err());

        let mut policy = CircuitBreakerPolicy::default();
        policy.half_open_max_requests = 0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_zero_open_duration_allowed() {
        let policy = CircuitBreakerPolicy {
            open_duration: Duration::ZERO,
            ..Default::default()
        };
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_excessive_open_duration_rejected() {
        let policy = CircuitBreakerPolicy {
            open_duration: Duration::from_secs(7200),
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }
}
