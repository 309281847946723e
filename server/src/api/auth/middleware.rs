//! Bearer authentication gate

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use super::context::CurrentUser;
use super::jwt::TokenAuthenticator;
use crate::api::error::GateError;
use crate::data::Principal;
use crate::data::cache::UserCache;
use crate::utils::header::credentials_for_scheme;

/// Shared state for the authentication gate
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenAuthenticator>,
    pub users: UserCache,
    /// Upper bound on principal resolution (cache plus store)
    pub lookup_timeout: Duration,
}

impl AuthState {
    /// Verify the bearer token in `headers` and resolve its principal
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, GateError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(GateError::MissingCredentials)?;
        let value = value
            .to_str()
            .map_err(|_| GateError::MalformedCredentials)?;
        let token = credentials_for_scheme(value, "Bearer").ok_or(GateError::MalformedCredentials)?;

        let claims = self.tokens.verify(token)?;
        let user_id = claims
            .principal_id()
            .ok_or(GateError::MalformedCredentials)?;

        match tokio::time::timeout(self.lookup_timeout, self.users.get(user_id)).await {
            Ok(Ok(principal)) => Ok(principal),
            Ok(Err(e)) => {
                if !e.is_not_found() {
                    tracing::error!(user_id, error = %e, "Principal lookup failed");
                }
                Err(GateError::from_principal_lookup(user_id, e))
            }
            Err(_) => Err(GateError::Cancelled),
        }
    }
}

/// Authentication middleware
///
/// Injects `CurrentUser` into request extensions on success.
pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let principal = match state.authenticate(request.headers()).await {
        Ok(principal) => principal,
        Err(e) => {
            tracing::debug!(path = %request.uri().path(), error = %e, "Authentication failed");
            return Err(e);
        }
    };

    tracing::trace!(user_id = principal.id, "Authenticated");
    request
        .extensions_mut()
        .insert(CurrentUser(Arc::new(principal)));
    Ok(next.run(request).await)
}
