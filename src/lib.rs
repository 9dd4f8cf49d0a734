#![allow(clippy::doc_markdown)] // Allow technical terms like ChainGate, Redis in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # ChainGate Core
//!
//! Resilience and caching core of the ChainGate blockchain API gateway.
//!
//! ## Overview
//!
//! Gateway instances serve blockchain read traffic (chains, balances,
//! transactions, token prices) from one shared Redis-compatible cache before
//! falling through to upstream data sources. This crate holds everything
//! that makes the fleet behave as one: the cache store and its key contract,
//! the read-through fetch orchestrator with negative caching and stale-write
//! protection, per-dependency circuit breakers, and fixed-window rate
//! limiting on shared counters.
//!
//! ## Architecture
//!
//! All coordination state lives in the shared backend, none in the instance:
//! a gateway process can be restarted, added, or removed without any warmup
//! handshake. Cache keys group values that invalidate together and fields
//! separate parameter variants, so one deletion drops every variant of a
//! resource at once. Every write carries a bounded TTL with deviation, which
//! keeps entries from expiring in lockstep across the fleet.
//!
//! ## Module Organization
//!
//! - [`cache`] - Shared-backend store, key routing, TTL policy, read-through fetch
//! - [`resilience`] - Per-dependency circuit breakers behind a registry
//! - [`ratelimit`] - Fixed-window request limiting on shared counters
//! - [`config`] - YAML configuration with environment overrides
//! - [`error`] - Crate-wide error type with stable classification
//! - [`logging`] - Structured tracing initialization
//! - [`upstream`] - Upstream call outcomes driving the fetch and breaker paths
//! - [`constants`] - Wire-format constants and defaults
//! - [`test_helpers`] - Deterministic in-memory cache provider
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chaingate_core::cache::{CacheFirstFetcher, CacheRouter, RedisCacheService};
//! use chaingate_core::config::ConfigManager;
//! use chaingate_core::upstream::UpstreamError;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! chaingate_core::logging::init_structured_logging();
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//!
//! let store = Arc::new(RedisCacheService::from_config(config).await?);
//! let fetcher = CacheFirstFetcher::new(store);
//!
//! let location = CacheRouter::account_balances("1", "0xAbC123", true, false);
//! let balances: serde_json::Value = fetcher
//!     .fetch_or_execute(
//!         &location,
//!         async {
//!             // Upstream call goes here
//!             Ok::<_, UpstreamError>(serde_json::json!({ "balances": [] }))
//!         },
//!         config.cache.default_ttl_seconds,
//!         config.cache.not_found_ttl_seconds,
//!     )
//!     .await?;
//! println!("{balances}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Unit and scenario tests run against the in-memory provider:
//!
//! ```bash
//! cargo test                            # no external services needed
//! cargo test --features test-services   # integration tests against live Redis
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod ratelimit;
pub mod resilience;
pub mod test_helpers;
pub mod upstream;

pub use cache::{
    CacheError, CacheFirstFetcher, CacheLocation, CacheRouter, CacheService, FetchError,
    RedisCacheService,
};
pub use config::{ConfigManager, GatewayConfig};
pub use error::{GatewayError, Result};
pub use ratelimit::{RateLimitError, RateLimitGuard};
pub use resilience::{
    CircuitBreaker, CircuitBreakerPolicy, CircuitBreakerRegistry, CircuitOpenError, CircuitState,
};
pub use upstream::UpstreamError;
