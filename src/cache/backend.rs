//! Pluggable backend trait for the object cache.
//!
//! The rebuild only ever needs to drop stale keys, but backends expose the
//! full get/set/delete surface so they can be exercised and inspected.

use async_trait::async_trait;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors from cache backend operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Unsupported cache backend: {0}")]
    Unsupported(String),
}

impl From<diesel::result::Error> for CacheError {
    fn from(e: diesel::result::Error) -> Self {
        CacheError::Database(e.to_string())
    }
}

/// Trait for object cache storage backends.
///
/// Implementations must be thread-safe.
#[async_trait]
pub trait ObjectCache: Send + Sync {
    /// Short backend name for progress output.
    fn name(&self) -> &'static str;

    /// Get a live value.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a value without expiry.
    async fn set(&self, key: &str, value: &str) -> CacheResult<()>;

    /// Remove a key. Returns whether it was present.
    async fn delete(&self, key: &str) -> CacheResult<bool>;
}
