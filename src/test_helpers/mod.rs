// Test Helpers Module
//
// Deterministic in-process implementations of the cache contract, used by
// unit and scenario tests (and usable as a local development provider when
// no shared backend is running).

pub mod memory_cache;

pub use memory_cache::InMemoryCacheService;
