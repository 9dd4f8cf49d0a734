//! # Distributed Cache Subsystem
//!
//! Shared-backend caching for every gateway instance: one Redis-compatible
//! store holds the entries, the invalidation markers, and the rate limit
//! counters that all instances coordinate through.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    CacheFirstFetcher                       │
//! │   read-through, negative caching, stale-write discard      │
//! └──────────────────────────┬─────────────────────────────────┘
//!                            │ CacheService trait
//! ┌──────────────────────────▼─────────────────────────────────┐
//! │  RedisCacheService                 InMemoryCacheService    │
//! │  (production, shared)              (test double)           │
//! └──────────────────────────┬─────────────────────────────────┘
//!                            │
//!              hash keys ────┤──── plain counter keys
//!        `[prefix-]<key>`    │     `[prefix-]rate_limit:...`
//!                            ▼
//!                  Redis-compatible backend
//! ```
//!
//! Keys group values that invalidate together; fields separate parameter
//! variants. The [`router::CacheRouter`] is the only place key strings are
//! composed; [`ttl`] guarantees every write expires.

pub mod errors;
pub mod fetch;
pub mod location;
pub mod router;
pub mod store;
pub mod traits;
pub mod ttl;

pub use errors::{CacheError, CacheResult};
pub use fetch::{CacheFirstFetcher, FetchError};
pub use location::CacheLocation;
pub use router::CacheRouter;
pub use store::RedisCacheService;
pub use traits::CacheService;
pub use ttl::{cap_ttl, deviate_ttl, effective_ttl};
