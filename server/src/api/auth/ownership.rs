//! Ownership-or-role authorization for mutating post routes

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::context::CurrentUser;
use crate::api::error::GateError;
use crate::data::{DataError, PostRepository, Principal, RoleRepository};

/// Result of an ownership check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Decides whether a principal may act on a resource
///
/// Owners always pass. Anyone else needs a role whose level is at least that
/// of the required role.
#[derive(Clone)]
pub struct OwnershipAuthorizer {
    roles: Arc<dyn RoleRepository>,
    posts: Arc<dyn PostRepository>,
    lookup_timeout: Duration,
}

impl OwnershipAuthorizer {
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        posts: Arc<dyn PostRepository>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            roles,
            posts,
            lookup_timeout,
        }
    }

    pub async fn authorize(
        &self,
        principal: &Principal,
        owner_id: i64,
        required_role: &str,
    ) -> Result<Access, GateError> {
        if principal.id == owner_id {
            return Ok(Access::Allow);
        }

        let required = match self.bounded(self.roles.get_by_name(required_role)).await? {
            Ok(role) => role,
            Err(DataError::NotFound { .. }) => {
                tracing::error!(role = required_role, "Required role missing from role table");
                return Err(GateError::RoleNotFound(required_role.to_string()));
            }
            Err(e) => {
                tracing::error!(role = required_role, error = %e, "Role lookup failed");
                return Err(GateError::Internal(e.to_string()));
            }
        };

        if principal.role.satisfies(&required) {
            Ok(Access::Allow)
        } else {
            Ok(Access::Deny)
        }
    }

    /// Guard state for a route requiring `required_role` from non-owners
    pub fn wrap(&self, required_role: &'static str) -> OwnershipGuard {
        OwnershipGuard {
            authorizer: self.clone(),
            required_role,
        }
    }

    async fn owner_of(&self, post_id: i64) -> Result<i64, GateError> {
        match self.bounded(self.posts.get_owner(post_id)).await? {
            Ok(owner) => Ok(owner),
            Err(DataError::NotFound { .. }) => Err(GateError::NotFound("post")),
            Err(e) => {
                tracing::error!(post_id, error = %e, "Post owner lookup failed");
                Err(GateError::Internal(e.to_string()))
            }
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = T>,
    ) -> Result<T, GateError> {
        tokio::time::timeout(self.lookup_timeout, fut)
            .await
            .map_err(|_| GateError::Cancelled)
    }
}

/// Middleware state produced by [`OwnershipAuthorizer::wrap`]
#[derive(Clone)]
pub struct OwnershipGuard {
    authorizer: OwnershipAuthorizer,
    required_role: &'static str,
}

/// Runs the wrapped handler only when the current user owns the post in the
/// path or outranks `required_role`
pub async fn require_ownership(
    State(guard): State<OwnershipGuard>,
    Path(post_id): Path<i64>,
    user: CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let owner_id = guard.authorizer.owner_of(post_id).await?;

    match guard
        .authorizer
        .authorize(&user, owner_id, guard.required_role)
        .await?
    {
        Access::Allow => Ok(next.run(request).await),
        Access::Deny => {
            tracing::debug!(
                user_id = user.id,
                post_id,
                required_role = guard.required_role,
                "Ownership check denied"
            );
            Err(GateError::Forbidden)
        }
    }
}
