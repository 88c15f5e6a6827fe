//! Object cache used to invalidate derived data after a rebuild.
//!
//! Backends:
//! - In-memory (`none` or `memory`, ephemeral)
//! - Database (`objectcache` table in the wiki database)
//! - Redis (feature `redis-backend`)

mod backend;
mod database;
mod memory;

#[cfg(feature = "redis-backend")]
mod redis;

pub use backend::{CacheError, CacheResult, ObjectCache};
pub use database::DatabaseCache;
pub use memory::MemoryCache;

#[cfg(feature = "redis-backend")]
pub use self::redis::RedisCache;

use crate::repository::DbPool;

/// Which cache backend a configuration names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// No shared cache; purges hit a throwaway in-memory store.
    None,
    Database,
    Redis(String),
}

impl CacheBackend {
    /// Parse a `cache` setting: `none`, `memory`, `database` or a `redis://` URL.
    pub fn parse(value: &str) -> CacheResult<Self> {
        match value.trim() {
            "" | "none" | "memory" => Ok(Self::None),
            "database" | "db" => Ok(Self::Database),
            url if url.starts_with("redis://") || url.starts_with("rediss://") => {
                Ok(Self::Redis(url.to_string()))
            }
            other => Err(CacheError::Unsupported(other.to_string())),
        }
    }
}

/// Open the configured cache backend.
pub async fn open(backend: &CacheBackend, pool: &DbPool) -> CacheResult<Box<dyn ObjectCache>> {
    match backend {
        CacheBackend::None => Ok(Box::new(MemoryCache::new())),
        CacheBackend::Database => Ok(Box::new(DatabaseCache::new(pool.clone()))),
        #[cfg(feature = "redis-backend")]
        CacheBackend::Redis(url) => Ok(Box::new(RedisCache::new(url).await?)),
        #[cfg(not(feature = "redis-backend"))]
        CacheBackend::Redis(_) => Err(CacheError::Unsupported(
            "redis (rebuild with --features redis-backend)".to_string(),
        )),
    }
}
