//! Cache error types shared by every `CacheService` implementation.

use thiserror::Error;

/// Errors surfaced by cache operations.
///
/// Backend faults are never downgraded to misses: callers always see the
/// distinction between "not cached" (`Ok(None)`) and "the cache layer
/// failed" (`Err`).
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to establish or maintain the backend connection
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    /// Failed to serialize or deserialize a cached payload
    #[error("Cache serialization error: {0}")]
    SerializationError(String),

    /// Operation exceeded its time budget
    #[error("Cache operation timeout: {0}")]
    Timeout(String),

    /// The backend rejected or failed the operation
    #[error("Cache backend error: {0}")]
    BackendError(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
