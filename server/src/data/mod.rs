//! Data layer
//!
//! - `models` - Principal and Role records
//! - `traits` - Repository traits read by the gatekeeping layer
//! - `postgres` - PostgreSQL store
//! - `memory` - In-memory store (no database configured, tests)
//! - `cache` - Cache backends and the read-through user cache
//! - `rate_limiter` - Fixed-window per-client rate limiter
//! - `error` - Data layer error type

pub mod cache;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod rate_limiter;
pub mod traits;

use std::sync::Arc;

pub use error::DataError;
pub use memory::MemoryStore;
pub use models::{Principal, Role};
pub use postgres::PostgresStore;
pub use rate_limiter::{RateLimitDecision, RateLimiter};
pub use traits::{PostRepository, RoleRepository, Store, UserRepository};

/// Shared handles to the store, one per repository trait
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub posts: Arc<dyn PostRepository>,
}

impl Repositories {
    pub fn from_store<S: Store + 'static>(store: Arc<S>) -> Self {
        Self {
            users: store.clone(),
            roles: store.clone(),
            posts: store,
        }
    }
}
