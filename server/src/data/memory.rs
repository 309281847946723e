//! In-memory store
//!
//! Used when no database URL is configured and as the store double in tests.
//! Seeded with the default role ladder.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::constants::{ROLE_ADMIN, ROLE_MODERATOR, ROLE_USER};
use crate::data::error::DataError;
use crate::data::models::{Principal, Role};
use crate::data::traits::{PostRepository, RoleRepository, UserRepository};

/// Default roles as `(name, description, level)`
const DEFAULT_ROLES: [(&str, &str, i32); 3] = [
    (ROLE_USER, "A user can create posts and comments", 1),
    (ROLE_MODERATOR, "A moderator can update other users' posts", 2),
    (ROLE_ADMIN, "An admin can update and delete other users' posts", 3),
];

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<i64, Principal>>,
    roles: RwLock<HashMap<String, Role>>,
    post_owners: RwLock<HashMap<i64, i64>>,
    user_reads: AtomicU64,
}

impl MemoryStore {
    /// Empty store with the default roles
    pub fn new() -> Self {
        let store = Self::default();
        for (idx, (name, description, level)) in DEFAULT_ROLES.iter().enumerate() {
            store.insert_role(Role {
                id: idx as i64 + 1,
                name: (*name).to_string(),
                description: (*description).to_string(),
                level: *level,
            });
        }
        store
    }

    pub fn role(&self, name: &str) -> Option<Role> {
        self.roles.read().get(name).cloned()
    }

    pub fn insert_role(&self, role: Role) {
        self.roles.write().insert(role.name.clone(), role);
    }

    pub fn insert_user(&self, principal: Principal) {
        self.users.write().insert(principal.id, principal);
    }

    pub fn remove_user(&self, id: i64) -> Option<Principal> {
        self.users.write().remove(&id)
    }

    pub fn insert_post(&self, post_id: i64, owner_id: i64) {
        self.post_owners.write().insert(post_id, owner_id);
    }

    /// Number of `get_by_id` calls served so far
    pub fn user_reads(&self) -> u64 {
        self.user_reads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_by_id(&self, id: i64) -> Result<Principal, DataError> {
        self.user_reads.fetch_add(1, Ordering::Relaxed);
        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| DataError::not_found("user", id))
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn get_by_name(&self, name: &str) -> Result<Role, DataError> {
        self.role(name)
            .ok_or_else(|| DataError::not_found("role", name))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn get_owner(&self, post_id: i64) -> Result<i64, DataError> {
        self.post_owners
            .read()
            .get(&post_id)
            .copied()
            .ok_or_else(|| DataError::not_found("post", post_id))
    }
}
