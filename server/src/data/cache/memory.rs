//! moka-backed in-process cache

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use super::backend::CacheBackend;
use super::error::CacheError;

/// Stored bytes plus the lifetime requested when they were written
#[derive(Clone)]
struct Slot {
    bytes: Arc<[u8]>,
    ttl: Option<Duration>,
}

/// Every write restarts the clock with its own TTL; reads leave it alone.
struct PerWriteTtl;

impl Expiry<String, Slot> for PerWriteTtl {
    fn expire_after_create(&self, _key: &String, slot: &Slot, _at: Instant) -> Option<Duration> {
        slot.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        slot: &Slot,
        _at: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        slot.ttl
    }
}

pub struct InMemoryCache {
    slots: Cache<String, Slot>,
}

impl InMemoryCache {
    /// Bounded cache holding at most `max_entries` keys
    pub fn new(max_entries: u64) -> Self {
        Self {
            slots: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(PerWriteTtl)
                .build(),
        }
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.slots.get(key).await.map(|slot| slot.bytes.to_vec()))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let slot = Slot {
            bytes: value.into(),
            ttl,
        };
        self.slots.insert(key.to_owned(), slot).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.slots.remove(key).await.is_some())
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let cache = InMemoryCache::new(100);
        cache.set("user-1", b"{}".to_vec(), None).await.unwrap();
        assert_eq!(cache.get("user-1").await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(cache.get("user-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rewrite_replaces_value_and_ttl() {
        let cache = InMemoryCache::new(100);
        cache
            .set("user-1", b"a".to_vec(), Some(Duration::from_millis(30)))
            .await
            .unwrap();
        cache.set("user-1", b"b".to_vec(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.slots.run_pending_tasks().await;

        assert_eq!(cache.get("user-1").await.unwrap(), Some(b"b".to_vec()));
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let cache = InMemoryCache::new(100);
        cache
            .set("user-1", b"a".to_vec(), Some(Duration::from_millis(30)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.slots.run_pending_tasks().await;

        assert_eq!(cache.get("user-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let cache = InMemoryCache::new(100);
        cache.set("user-1", b"a".to_vec(), None).await.unwrap();
        assert!(cache.delete("user-1").await.unwrap());
        assert!(!cache.delete("user-1").await.unwrap());
    }
}
