//! Gatekeeping error type
//!
//! Every authentication failure renders the same 401 body so a caller cannot
//! tell a malformed token from an expired one or a wrong password from an
//! unknown user. The concrete cause is only logged.

use std::time::Duration;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use super::auth::TokenError;
use crate::data::DataError;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("authorization header is missing")]
    MissingCredentials,

    #[error("authorization header is malformed")]
    MalformedCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    ExpiredToken,

    #[error("token is not yet valid")]
    NotYetValid,

    #[error("token issuer or audience mismatch")]
    IssuerMismatch,

    #[error("principal {0} does not exist")]
    UnknownPrincipal(i64),

    /// Basic credentials did not match
    #[error("invalid credentials")]
    Unauthorized,

    #[error("insufficient privilege")]
    Forbidden,

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimitExceeded { retry_after: Duration },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("role not found: {0}")]
    RoleNotFound(String),

    #[error("request cancelled before the gate completed")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials
            | Self::MalformedCredentials
            | Self::InvalidToken(_)
            | Self::ExpiredToken
            | Self::NotYetValid
            | Self::IssuerMismatch
            | Self::UnknownPrincipal(_)
            | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Cancelled => StatusCode::REQUEST_TIMEOUT,
            Self::RoleNotFound(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a store error hit while resolving a principal
    pub fn from_principal_lookup(id: i64, err: DataError) -> Self {
        match err {
            DataError::NotFound { .. } => Self::UnknownPrincipal(id),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<TokenError> for GateError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::ExpiredToken,
            TokenError::NotYetValid => Self::NotYetValid,
            TokenError::IssuerMismatch => Self::IssuerMismatch,
            TokenError::Invalid(msg) => Self::InvalidToken(msg),
            TokenError::Signing(msg) => Self::Internal(msg),
        }
    }
}

/// Whole seconds for a `Retry-After` header, rounded up
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::MissingCredentials
            | Self::MalformedCredentials
            | Self::InvalidToken(_)
            | Self::ExpiredToken
            | Self::NotYetValid
            | Self::IssuerMismatch
            | Self::UnknownPrincipal(_)
            | Self::Unauthorized => (
                status,
                Json(json!({
                    "error": "unauthorized",
                    "code": "AUTH_FAILED",
                    "message": "authorization failed",
                })),
            )
                .into_response(),
            Self::Forbidden => (
                status,
                Json(json!({
                    "error": "forbidden",
                    "code": "FORBIDDEN",
                    "message": "insufficient privilege for this resource",
                })),
            )
                .into_response(),
            Self::RateLimitExceeded { retry_after } => {
                let secs = retry_after_secs(retry_after);
                let mut response = (
                    status,
                    Json(json!({
                        "error": "too_many_requests",
                        "code": "RATE_LIMITED",
                        "message": format!("rate limit exceeded, retry after {secs}s"),
                        "retry_after": secs,
                    })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                response
            }
            Self::NotFound(entity) => (
                status,
                Json(json!({
                    "error": "not_found",
                    "code": "NOT_FOUND",
                    "message": format!("{entity} not found"),
                })),
            )
                .into_response(),
            Self::Cancelled => (
                status,
                Json(json!({
                    "error": "request_timeout",
                    "code": "CANCELLED",
                    "message": "request was cancelled",
                })),
            )
                .into_response(),
            Self::RoleNotFound(_) | Self::Internal(_) => (
                status,
                Json(json!({
                    "error": "internal_error",
                    "code": "INTERNAL",
                    "message": "something went wrong",
                })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: GateError) -> (StatusCode, serde_json::Value, Response) {
        let response = err.into_response();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap();
        (status, value, Response::from_parts(parts, axum::body::Body::empty()))
    }

    #[tokio::test]
    async fn test_auth_failures_share_one_body() {
        let variants = [
            GateError::MissingCredentials,
            GateError::MalformedCredentials,
            GateError::InvalidToken("bad signature".into()),
            GateError::ExpiredToken,
            GateError::NotYetValid,
            GateError::IssuerMismatch,
            GateError::UnknownPrincipal(9),
            GateError::Unauthorized,
        ];

        let mut bodies = Vec::new();
        for err in variants {
            let (status, body, _) = body_json(err).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            bodies.push(body);
        }
        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(bodies[0]["message"], "authorization failed");
    }

    #[tokio::test]
    async fn test_rate_limit_discloses_retry_after() {
        let (status, body, response) = body_json(GateError::RateLimitExceeded {
            retry_after: Duration::from_millis(1500),
        })
        .await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["retry_after"], 2);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[tokio::test]
    async fn test_internal_detail_not_leaked() {
        let (status, body, _) =
            body_json(GateError::Internal("connection refused to 10.0.0.5".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("10.0.0.5"));

        let (status, _, _) = body_json(GateError::RoleNotFound("admin".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(GateError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(GateError::Cancelled.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(GateError::NotFound("post").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_secs(2)), 2);
        assert_eq!(retry_after_secs(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(4999)), 5);
    }

    #[test]
    fn test_principal_lookup_mapping() {
        let err = GateError::from_principal_lookup(3, DataError::not_found("user", 3));
        assert!(matches!(err, GateError::UnknownPrincipal(3)));

        let err = GateError::from_principal_lookup(3, DataError::Config("x".into()));
        assert!(matches!(err, GateError::Internal(_)));
    }

    #[test]
    fn test_token_error_mapping() {
        assert!(matches!(
            GateError::from(TokenError::Expired),
            GateError::ExpiredToken
        ));
        assert!(matches!(
            GateError::from(TokenError::IssuerMismatch),
            GateError::IssuerMismatch
        ));
    }
}
