//! Read-through user cache
//!
//! Maps a principal id to a JSON snapshot of the user under `user-<id>`.
//! The store stays authoritative: every cache failure degrades to a store
//! read, and a failed cache write never fails the lookup that triggered it.

use std::sync::Arc;
use std::time::Duration;

use super::backend::CacheBackend;
use super::error::CacheError;
use super::key::CacheKey;
use crate::data::error::DataError;
use crate::data::models::Principal;
use crate::data::traits::UserRepository;

#[derive(Clone)]
pub struct UserCache {
    backend: Arc<dyn CacheBackend>,
    users: Arc<dyn UserRepository>,
    ttl: Duration,
}

impl UserCache {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        users: Arc<dyn UserRepository>,
        ttl: Duration,
    ) -> Self {
        Self {
            backend,
            users,
            ttl,
        }
    }

    /// Resolve a principal, reading the store only on a cache miss
    pub async fn get(&self, id: i64) -> Result<Principal, DataError> {
        if let Some(principal) = self.lookup(id).await {
            tracing::trace!(user_id = id, "User cache hit");
            return Ok(principal);
        }

        tracing::trace!(user_id = id, "User cache miss");
        let principal = self.users.get_by_id(id).await?;

        if let Err(e) = self.set(&principal).await {
            tracing::warn!(user_id = id, error = %e, "Failed to cache user");
        }

        Ok(principal)
    }

    /// Write a snapshot, replacing any existing entry for the same id
    pub async fn set(&self, principal: &Principal) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(principal)?;
        self.backend
            .set(&CacheKey::user(principal.id), bytes, Some(self.ttl))
            .await
    }

    /// Drop the snapshot for `id` so the next `get` reads the store
    pub async fn invalidate(&self, id: i64) -> Result<bool, CacheError> {
        self.backend.delete(&CacheKey::user(id)).await
    }

    pub async fn health_check(&self) -> Result<(), CacheError> {
        self.backend.health_check().await
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Cached snapshot for `id`. Backend errors and undecodable entries are misses.
    async fn lookup(&self, id: i64) -> Option<Principal> {
        let key = CacheKey::user(id);
        let bytes = match self.backend.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(user_id = id, error = %e, "Cache get error, reading store");
                return None;
            }
        };

        match serde_json::from_slice::<Principal>(&bytes) {
            Ok(principal) if principal.id == id => Some(principal),
            Ok(principal) => {
                tracing::warn!(
                    user_id = id,
                    cached_id = principal.id,
                    "Cached user does not match key, reading store"
                );
                None
            }
            Err(e) => {
                tracing::warn!(user_id = id, error = %e, "Corrupt cached user, reading store");
                None
            }
        }
    }
}
