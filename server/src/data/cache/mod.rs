//! Cache module
//!
//! Pluggable cache backends:
//! - In-memory (default) - uses moka
//! - Redis - uses deadpool-redis
//!
//! and the read-through [`UserCache`] built on top of them.

mod backend;
mod error;
mod key;
mod memory;
mod redis;
mod user;

use std::sync::Arc;

pub use backend::CacheBackend;
pub use error::CacheError;
pub use key::CacheKey;
pub use memory::InMemoryCache;
pub use user::UserCache;

use crate::core::config::{CacheBackendType, CacheConfig};

/// Create the cache backend selected by configuration
pub async fn connect(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>, CacheError> {
    let backend: Arc<dyn CacheBackend> = match config.backend {
        CacheBackendType::Memory => {
            tracing::debug!(
                max_entries = config.max_entries,
                "Initializing in-memory cache"
            );
            Arc::new(InMemoryCache::new(config.max_entries))
        }
        CacheBackendType::Redis => {
            let url = config.redis_url.as_ref().ok_or_else(|| {
                CacheError::Config("redis_url required for Redis backend".into())
            })?;
            Arc::new(redis::RedisCache::new(url).await?)
        }
    };

    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_memory() {
        let config = CacheConfig {
            backend: CacheBackendType::Memory,
            max_entries: 100,
            redis_url: None,
        };
        let backend = connect(&config).await.unwrap();
        assert_eq!(backend.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_connect_redis_requires_url() {
        let config = CacheConfig {
            backend: CacheBackendType::Redis,
            max_entries: 100,
            redis_url: None,
        };
        let err = connect(&config).await.err().unwrap();
        assert!(matches!(err, CacheError::Config(_)));
    }
}
