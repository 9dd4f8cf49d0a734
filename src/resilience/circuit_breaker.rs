//! # Circuit Breaker State Machine
//!
//! Per-dependency fault isolation for the gateway's upstreams. Follows the
//! classic three-state pattern:
//!
//! ```text
//!                failure_threshold reached
//!     Closed ────────────────────────────────► Open
//!        ▲                                      │
//!        │ success_threshold                    │ open_duration elapsed
//!        │ trials succeeded                     ▼
//!        └───────────────────────────────── HalfOpen ──► Open (any trial fails)
//! ```
//!
//! All hot-path state is atomic; admission checks and recording never take a
//! lock across an await. While half-open, at most `half_open_max_requests`
//! trial calls hold a slot concurrently; every admitted trial must be
//! completed with [`CircuitBreaker::record_success`] or
//! [`CircuitBreaker::record_failure`] so its slot is released.

use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::resilience::config::CircuitBreakerPolicy;
use crate::resilience::metrics::CircuitBreakerMetrics;

/// Get current epoch milliseconds from SystemTime
#[inline]
fn epoch_millis_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed = 0,
    /// Failure mode - all calls fail fast without executing
    Open = 1,
    /// Testing recovery - limited trial calls allowed through
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open, // Default to safest state
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        f.write_str(label)
    }
}

/// A call was rejected because its dependency's circuit is not admitting
/// traffic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("circuit breaker rejected call to {dependency} (state: {state})")]
pub struct CircuitOpenError {
    pub dependency: String,
    pub state: CircuitState,
}

/// Errors produced by breaker-wrapped operations
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Rejected without executing: the circuit is open
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),

    /// Operation executed and failed; the failure was recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

/// Lock-free circuit breaker for one upstream dependency.
///
/// The policy sits behind a `RwLock` so re-registration can swap it without
/// disturbing state; it is read once per admission or recording and never
/// held across an await.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Dependency name for logging and metrics
    name: String,

    /// Current circuit state (atomic for thread safety)
    state: AtomicU8,

    /// Swappable policy; state survives policy updates
    policy: RwLock<CircuitBreakerPolicy>,

    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,

    /// Failures since the last success while closed
    consecutive_failures: AtomicU32,

    /// Successes recorded since entering half-open
    half_open_successes: AtomicU32,

    /// Trial calls currently holding a half-open slot
    half_open_in_flight: AtomicU32,

    /// Epoch millis when the circuit opened (0 = not open).
    /// Release/Acquire paired with state transitions.
    opened_at_epoch_ms: AtomicU64,
}

impl CircuitBreaker {
    /// Create a new circuit breaker for a named dependency
    pub fn new(name: impl Into<String>, policy: CircuitBreakerPolicy) -> Self {
        let name = name.into();
        info!(
            dependency = %name,
            failure_threshold = policy.failure_threshold,
            success_threshold = policy.success_threshold,
            open_duration_ms = policy.open_duration.as_millis() as u64,
            half_open_max_requests = policy.half_open_max_requests,
            "Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            policy: RwLock::new(policy),
            total_calls: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            consecutive_failures: AtomicU32::new(0),
            half_open_successes: AtomicU32::new(0),
            half_open_in_flight: AtomicU32::new(0),
            opened_at_epoch_ms: AtomicU64::new(0),
        }
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Get dependency name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current policy (cloned snapshot)
    pub fn policy(&self) -> CircuitBreakerPolicy {
        self.policy.read().clone()
    }

    /// Swap the policy in place. State, counters, and the opened-at
    /// timestamp are untouched, so repeated registration is harmless.
    pub fn update_policy(&self, policy: CircuitBreakerPolicy) {
        info!(
            dependency = %self.name,
            failure_threshold = policy.failure_threshold,
            success_threshold = policy.success_threshold,
            open_duration_ms = policy.open_duration.as_millis() as u64,
            half_open_max_requests = policy.half_open_max_requests,
            "Circuit breaker policy updated"
        );
        *self.policy.write() = policy;
    }

    /// May a call to this dependency go ahead right now?
    ///
    /// While open, the first check after `open_duration` has elapsed moves
    /// the circuit to half-open. While half-open, a `true` result holds one
    /// of the limited trial slots: the caller must follow up with
    /// [`record_success`] or [`record_failure`] to release it.
    ///
    /// [`record_success`]: CircuitBreaker::record_success
    /// [`record_failure`]: CircuitBreaker::record_failure
    pub fn can_proceed(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let opened_ms = self.opened_at_epoch_ms.load(Ordering::Acquire);
                if opened_ms == 0 {
                    // Open without a timestamp - shouldn't happen, but allow the call
                    warn!(dependency = %self.name, "Circuit open but no timestamp recorded");
                    return true;
                }

                let elapsed_ms = epoch_millis_now().saturating_sub(opened_ms);
                let open_for_ms = self.policy.read().open_duration.as_millis() as u64;

                if elapsed_ms >= open_for_ms {
                    self.try_transition_open_to_half_open();
                    self.try_reserve_trial()
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => self.try_reserve_trial(),
        }
    }

    /// Admission as a `Result`, carrying the dependency and state on
    /// rejection.
    pub fn check(&self) -> Result<(), CircuitOpenError> {
        if self.can_proceed() {
            Ok(())
        } else {
            Err(CircuitOpenError {
                dependency: self.name.clone(),
                state: self.state(),
            })
        }
    }

    /// Record a successful operation (lock-free, never fails)
    pub fn record_success(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);

        match self.state() {
            CircuitState::Closed => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
            }
            CircuitState::HalfOpen => {
                self.release_trial();
                let successes = self.half_open_successes.fetch_add(1, Ordering::AcqRel) + 1;
                let needed = self.policy.read().success_threshold;
                debug!(
                    dependency = %self.name,
                    successes = successes,
                    needed = needed,
                    "Half-open trial succeeded"
                );
                if successes >= needed {
                    self.transition_to_closed();
                }
            }
            CircuitState::Open => {
                warn!(dependency = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    /// Record a failed operation (lock-free, never fails)
    pub fn record_failure(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);

        match self.state() {
            CircuitState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
                let threshold = self.policy.read().failure_threshold;
                warn!(
                    dependency = %self.name,
                    consecutive_failures = failures,
                    failure_threshold = threshold,
                    "Failure recorded"
                );
                if failures >= threshold {
                    self.transition_to_open();
                }
            }
            CircuitState::HalfOpen => {
                // Any failure during recovery testing reopens immediately
                self.release_trial();
                self.transition_to_open();
            }
            CircuitState::Open => {
                // Already open, just tally it
            }
        }
    }

    /// Execute an operation with circuit breaker protection.
    ///
    /// Every error counts as a breaker failure. Use
    /// [`call_classified`](CircuitBreaker::call_classified) when some errors
    /// (client mistakes, not-found) should not.
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_classified(operation, |_| true).await
    }

    /// Execute an operation, consulting `is_failure` to decide whether an
    /// error counts toward tripping.
    ///
    /// Errors the classifier rejects are recorded as successes: the
    /// dependency answered, which is what the breaker measures. This also
    /// keeps half-open slot accounting exact.
    pub async fn call_classified<F, T, E, Fut, C>(
        &self,
        operation: F,
        is_failure: C,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
    {
        self.check()?;

        let result = operation().await;

        match &result {
            Ok(_) => self.record_success(),
            Err(e) if is_failure(e) => self.record_failure(),
            Err(_) => self.record_success(),
        }

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(dependency = %self.name, "Circuit breaker forced open");
        self.transition_to_open();
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(dependency = %self.name, "Circuit breaker forced closed");
        self.transition_to_closed();
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let total_calls = self.total_calls.load(Ordering::Relaxed);
        let success_count = self.success_count.load(Ordering::Relaxed);
        let failure_count = self.failure_count.load(Ordering::Relaxed);

        let (failure_rate, success_rate) = if total_calls > 0 {
            (
                failure_count as f64 / total_calls as f64,
                success_count as f64 / total_calls as f64,
            )
        } else {
            (0.0, 0.0)
        };

        CircuitBreakerMetrics {
            total_calls,
            success_count,
            failure_count,
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            half_open_in_flight: self.half_open_in_flight.load(Ordering::Relaxed),
            half_open_successes: self.half_open_successes.load(Ordering::Relaxed),
            current_state: self.state(),
            failure_rate,
            success_rate,
        }
    }

    /// Atomically claim a half-open trial slot. Over the cap, the call is
    /// rejected without consuming anything.
    fn try_reserve_trial(&self) -> bool {
        let max = self.policy.read().half_open_max_requests;
        self.half_open_in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |in_flight| {
                (in_flight < max).then_some(in_flight + 1)
            })
            .is_ok()
    }

    /// Release a trial slot. A trial may complete after the state has
    /// already moved on and reset the counter; never underflow.
    fn release_trial(&self) {
        let _ = self
            .half_open_in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |in_flight| {
                in_flight.checked_sub(1)
            });
    }

    /// CAS transition so exactly one caller wins when multiple checks see
    /// the open duration elapse at once. Half-open counters were already
    /// zeroed when the circuit opened, so losers can reserve immediately.
    fn try_transition_open_to_half_open(&self) {
        if self
            .state
            .compare_exchange(
                CircuitState::Open as u8,
                CircuitState::HalfOpen as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            info!(dependency = %self.name, "Circuit breaker half-open (testing recovery)");
        }
    }

    /// Transition to open state (failing fast)
    fn transition_to_open(&self) {
        self.opened_at_epoch_ms
            .store(epoch_millis_now(), Ordering::Release);
        self.half_open_successes.store(0, Ordering::Relaxed);
        self.half_open_in_flight.store(0, Ordering::Relaxed);

        // Store state last
        self.state.store(CircuitState::Open as u8, Ordering::Release);

        error!(
            dependency = %self.name,
            consecutive_failures = self.consecutive_failures.load(Ordering::Relaxed),
            open_duration_ms = self.policy.read().open_duration.as_millis() as u64,
            "Circuit breaker opened (failing fast)"
        );
    }

    /// Transition to closed state (normal operation)
    fn transition_to_closed(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.half_open_successes.store(0, Ordering::Relaxed);
        self.half_open_in_flight.store(0, Ordering::Relaxed);
        self.opened_at_epoch_ms.store(0, Ordering::Release);

        // Store state last (after counter resets)
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);

        info!(
            dependency = %self.name,
            total_calls = self.total_calls.load(Ordering::Relaxed),
            "Circuit breaker closed (recovered)"
        );
    }
}
