//! Repository traits
//!
//! The gatekeeping layer only reads from the store. Each trait is implemented
//! by the PostgreSQL adapter and by the in-memory store.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::models::{Principal, Role};

/// Principal lookup
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user with its role joined in. `DataError::NotFound` when absent.
    async fn get_by_id(&self, id: i64) -> Result<Principal, DataError>;
}

/// Role reference data lookup
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// `DataError::NotFound` when no role has this name.
    async fn get_by_name(&self, name: &str) -> Result<Role, DataError>;
}

/// Ownership lookup for posts
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Id of the user who created the post. `DataError::NotFound` when absent.
    async fn get_owner(&self, post_id: i64) -> Result<i64, DataError>;
}

/// Everything the gatekeeping layer reads from the store
pub trait Store: UserRepository + RoleRepository + PostRepository {}

impl<T: UserRepository + RoleRepository + PostRepository> Store for T {}
