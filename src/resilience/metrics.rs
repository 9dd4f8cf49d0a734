//! Circuit breaker observability snapshots.

use serde::{Deserialize, Serialize};

use crate::resilience::circuit_breaker::CircuitState;

/// Point-in-time view of one breaker, safe to hand to health endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    pub total_calls: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Current run of failures while closed (resets on success)
    pub consecutive_failures: u32,
    /// Trial calls currently holding a half-open slot
    pub half_open_in_flight: u32,
    /// Consecutive successes recorded so far while half-open
    pub half_open_successes: u32,
    pub current_state: CircuitState,
    pub failure_rate: f64,
    pub success_rate: f64,
}

impl CircuitBreakerMetrics {
    /// Closed and not failing more than one call in ten.
    ///
    /// Breakers with too little traffic to judge report healthy.
    pub fn is_healthy(&self) -> bool {
        if self.current_state != CircuitState::Closed {
            return false;
        }
        if self.total_calls < 10 {
            return true;
        }
        self.failure_rate < 0.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(state: CircuitState, total: u64, failures: u64) -> CircuitBreakerMetrics {
        CircuitBreakerMetrics {
            total_calls: total,
            success_count: total - failures,
            failure_count: failures,
            consecutive_failures: 0,
            half_open_in_flight: 0,
            half_open_successes: 0,
            current_state: state,
            failure_rate: if total > 0 {
                failures as f64 / total as f64
            } else {
                0.0
            },
            success_rate: if total > 0 {
                (total - failures) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    #[test]
    fn test_open_circuit_is_unhealthy() {
        assert!(!snapshot(CircuitState::Open, 100, 50).is_healthy());
        assert!(!snapshot(CircuitState::HalfOpen, 100, 50).is_healthy());
    }

    #[test]
    fn test_low_traffic_reports_healthy() {
        assert!(snapshot(CircuitState::Closed, 5, 4).is_healthy());
    }

    #[test]
    fn test_failure_rate_threshold() {
        assert!(snapshot(CircuitState::Closed, 100, 9).is_healthy());
        assert!(!snapshot(CircuitState::Closed, 100, 15).is_healthy());
    }
}
