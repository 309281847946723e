//! Rate limiting middleware
//!
//! Runs before every other gate. Requests are keyed by client IP.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use super::error::GateError;
use crate::data::{RateLimitDecision, RateLimiter};

/// Rate limit middleware state
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
}

/// Client key: first `X-Forwarded-For` hop, else the peer address
///
/// The header is trusted as-is, so a client talking to the server directly
/// can pick its own key by sending it. Deploy behind a reverse proxy that
/// overwrites `X-Forwarded-For` rather than appending client-supplied values.
fn client_key(request: &Request) -> String {
    request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Add rate limit headers to an admitted response
fn add_rate_limit_headers(response: &mut Response, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(decision.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(decision.remaining));
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let key = client_key(&request);
    let decision = state.limiter.allow(&key);

    if !decision.admitted {
        tracing::debug!(
            %key,
            retry_after_ms = decision.retry_after.as_millis() as u64,
            "Rate limit exceeded"
        );
        return Err(GateError::RateLimitExceeded {
            retry_after: decision.retry_after,
        });
    }

    let mut response = next.run(request).await;
    add_rate_limit_headers(&mut response, &decision);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let mut request = Request::builder()
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(client_key(&request), "203.0.113.7");
    }

    #[test]
    fn test_client_key_falls_back_to_peer() {
        let mut request = Request::builder().body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(client_key(&request), "192.0.2.1");
    }

    #[test]
    fn test_client_key_unknown_without_peer() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&request), "unknown");
    }
}
