//! Basic credential gate for operational endpoints
//!
//! Every rejection other than a missing header is reported as the same
//! `GateError::Unauthorized`, whether the scheme, the encoding, the username or
//! the password was wrong.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::api::error::GateError;
use crate::core::config::BasicAuthConfig;
use crate::utils::crypto::constant_time_eq;
use crate::utils::header::credentials_for_scheme;

/// Validates `Authorization: Basic` against one configured pair
#[derive(Clone)]
pub struct BasicCredentialGate {
    username: Arc<str>,
    password: Arc<str>,
}

impl BasicCredentialGate {
    pub fn new(config: &BasicAuthConfig) -> Self {
        Self {
            username: Arc::from(config.username.as_str()),
            password: Arc::from(config.password.as_str()),
        }
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), GateError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(GateError::MissingCredentials)?;

        let (username, password) = decode_basic(value.to_str().ok())
            .ok_or(GateError::Unauthorized)?;

        // Compare both halves so timing does not reveal which one failed
        let user_ok = constant_time_eq(&username, &self.username);
        let pass_ok = constant_time_eq(&password, &self.password);
        if user_ok & pass_ok {
            Ok(())
        } else {
            Err(GateError::Unauthorized)
        }
    }
}

/// Decode `Basic base64(user:pass)`. The password may itself contain ':'.
fn decode_basic(value: Option<&str>) -> Option<(String, String)> {
    let encoded = credentials_for_scheme(value?, "Basic")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Middleware guarding operational routes
pub async fn require_basic(
    State(gate): State<BasicCredentialGate>,
    request: Request,
    next: Next,
) -> Result<Response, GateError> {
    if let Err(e) = gate.check(request.headers()) {
        tracing::debug!(path = %request.uri().path(), error = %e, "Basic auth rejected");
        return Err(e);
    }
    Ok(next.run(request).await)
}
