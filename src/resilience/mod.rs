//! # Resilience Module
//!
//! Fault tolerance for the gateway's upstream dependencies. Implements the
//! circuit breaker pattern with a per-dependency registry so failing
//! upstreams are isolated before they drag request latency down with them.
//!
//! ## Architecture
//!
//! - **Circuit Breakers**: lock-free three-state machines, one per upstream
//! - **Registry**: name-keyed, created on first use, policy overrides from
//!   configuration
//! - **Metrics**: point-in-time snapshots for health reporting
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chaingate_core::resilience::{CircuitBreakerPolicy, CircuitBreakerRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = CircuitBreakerRegistry::default();
//! registry.register_circuit("price-oracle", CircuitBreakerPolicy::for_price_oracle());
//!
//! let price = registry
//!     .guard("price-oracle", || async {
//!         // Upstream call here
//!         Ok::<_, Box<dyn std::error::Error>>("1999.42")
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod metrics;
pub mod registry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerError, CircuitOpenError, CircuitState,
};
pub use config::CircuitBreakerPolicy;
pub use metrics::CircuitBreakerMetrics;
pub use registry::CircuitBreakerRegistry;
