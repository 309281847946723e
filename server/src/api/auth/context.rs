//! Typed request-scoped principal

use std::ops::Deref;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::error::GateError;
use crate::data::Principal;

/// The authenticated principal for the current request
///
/// Inserted by the authentication gate. Handlers and later middleware take it
/// as an extractor; a route without the gate fails extraction with a 500.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Arc<Principal>);

impl Deref for CurrentUser {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| GateError::Internal("authentication gate not applied".into()))
    }
}
