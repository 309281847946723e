//! Router assembly and HTTP server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::middleware::from_fn_with_state;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::auth::{
    AuthState, BasicCredentialGate, OwnershipAuthorizer, TokenAuthenticator, require_auth,
    require_basic,
};
use super::error::GateError;
use super::rate_limit::{RateLimitState, rate_limit_middleware};
use super::routes::{health, posts, users};
use crate::core::config::ServerConfig;
use crate::data::RateLimiter;
use crate::data::cache::UserCache;

/// Everything the router needs, assembled once at startup
#[derive(Clone)]
pub struct ApiContext {
    pub tokens: Arc<TokenAuthenticator>,
    pub users: UserCache,
    pub authorizer: OwnershipAuthorizer,
    pub basic: BasicCredentialGate,
    /// `None` disables rate limiting
    pub rate_limiter: Option<Arc<RateLimiter>>,
    pub request_timeout: Duration,
}

/// Build the application router
///
/// Layer order, outermost first: trace, rate limit, request timeout, then the
/// per-group gates (basic for ops, bearer for users and posts) and finally
/// the ownership guard on mutating post routes.
pub fn router(ctx: &ApiContext) -> Router {
    let auth_state = AuthState {
        tokens: ctx.tokens.clone(),
        users: ctx.users.clone(),
        lookup_timeout: ctx.request_timeout,
    };

    let health_routes = health::routes(ctx.users.clone())
        .route_layer(from_fn_with_state(ctx.basic.clone(), require_basic));

    let users_routes =
        users::routes().route_layer(from_fn_with_state(auth_state.clone(), require_auth));

    let posts_routes = posts::routes(&ctx.authorizer)
        .route_layer(from_fn_with_state(auth_state, require_auth));

    let router = Router::new()
        .merge(health_routes)
        .merge(users_routes)
        .merge(posts_routes)
        .fallback(handle_404)
        .layer(TimeoutLayer::new(ctx.request_timeout));

    let router = match &ctx.rate_limiter {
        Some(limiter) => router.layer(from_fn_with_state(
            RateLimitState {
                limiter: limiter.clone(),
            },
            rate_limit_middleware,
        )),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

async fn handle_404() -> GateError {
    GateError::NotFound("route")
}

pub struct ApiServer {
    router: Router,
    addr: SocketAddr,
}

impl ApiServer {
    pub fn new(ctx: &ApiContext, config: &ServerConfig) -> Result<Self> {
        let addr = SocketAddr::new(
            config
                .host
                .parse()
                .with_context(|| format!("Invalid host address: {}", config.host))?,
            config.port,
        );

        Ok(Self {
            router: router(ctx),
            addr,
        })
    }

    /// Serve until `shutdown` resolves
    pub async fn start(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;

        tracing::info!(addr = %self.addr, "Listening");

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use axum::response::Response;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tower::ServiceExt;

    use crate::core::config::{BasicAuthConfig, TokenConfig};
    use crate::core::constants::{ROLE_ADMIN, ROLE_MODERATOR, ROLE_USER};
    use crate::data::cache::InMemoryCache;
    use crate::data::{MemoryStore, Principal, Repositories};

    const OWNER: i64 = 1;
    const MODERATOR: i64 = 2;
    const ADMIN: i64 = 3;
    const STRANGER: i64 = 4;
    const POST: i64 = 100;

    struct Harness {
        ctx: ApiContext,
        store: Arc<MemoryStore>,
    }

    impl Harness {
        fn new(rate_limiter: Option<Arc<RateLimiter>>) -> Self {
            let store = Arc::new(MemoryStore::new());
            for (id, role) in [
                (OWNER, ROLE_USER),
                (MODERATOR, ROLE_MODERATOR),
                (ADMIN, ROLE_ADMIN),
                (STRANGER, ROLE_USER),
            ] {
                store.insert_user(Principal {
                    id,
                    username: format!("user{id}"),
                    email: format!("user{id}@example.com"),
                    is_active: true,
                    role: store.role(role).unwrap(),
                });
            }
            store.insert_post(POST, OWNER);

            let repos = Repositories::from_store(store.clone());
            let backend = Arc::new(InMemoryCache::new(100));
            let users = UserCache::new(backend, repos.users.clone(), Duration::from_secs(60));

            let ctx = ApiContext {
                tokens: Arc::new(TokenAuthenticator::new(&TokenConfig {
                    secret: "test-secret".to_string(),
                    issuer: "socialfeed".to_string(),
                    expiry: Duration::from_secs(600),
                })),
                users,
                authorizer: OwnershipAuthorizer::new(
                    repos.roles.clone(),
                    repos.posts.clone(),
                    Duration::from_secs(5),
                ),
                basic: BasicCredentialGate::new(&BasicAuthConfig {
                    username: "ops".to_string(),
                    password: "ops-pass".to_string(),
                }),
                rate_limiter,
                request_timeout: Duration::from_secs(5),
            };

            Self { ctx, store }
        }

        fn bearer(&self, user_id: i64) -> String {
            format!("Bearer {}", self.ctx.tokens.issue_for(user_id).unwrap())
        }

        async fn send(&self, method: Method, uri: &str, auth: Option<String>) -> Response {
            let mut builder = Request::builder()
                .method(method)
                .uri(uri)
                .header("X-Forwarded-For", "198.51.100.1");
            if let Some(auth) = auth {
                builder = builder.header(header::AUTHORIZATION, auth);
            }
            router(&self.ctx)
                .oneshot(builder.body(Body::empty()).unwrap())
                .await
                .unwrap()
        }
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn basic(user: &str, pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
    }

    #[tokio::test]
    async fn test_health_requires_basic_auth() {
        let h = Harness::new(None);

        let response = h.send(Method::GET, "/api/v1/health", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = h
            .send(Method::GET, "/api/v1/health", Some(basic("ops", "ops-pass")))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache"]["backend"], "memory");
    }

    #[tokio::test]
    async fn test_health_rejections_are_identical() {
        let h = Harness::new(None);

        let wrong_password = h
            .send(Method::GET, "/api/v1/health", Some(basic("ops", "nope")))
            .await;
        let wrong_username = h
            .send(Method::GET, "/api/v1/health", Some(basic("root", "ops-pass")))
            .await;

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_username.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(wrong_password).await, json_body(wrong_username).await);
    }

    #[tokio::test]
    async fn test_me_returns_principal() {
        let h = Harness::new(None);

        let response = h
            .send(Method::GET, "/api/v1/users/me", Some(h.bearer(OWNER)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], OWNER);
        assert_eq!(body["role"]["name"], ROLE_USER);
    }

    #[tokio::test]
    async fn test_me_rejections_use_generic_body() {
        let h = Harness::new(None);

        let missing = h.send(Method::GET, "/api/v1/users/me", None).await;
        let malformed = h
            .send(Method::GET, "/api/v1/users/me", Some("Token abc".to_string()))
            .await;
        let garbage = h
            .send(Method::GET, "/api/v1/users/me", Some("Bearer abc".to_string()))
            .await;
        let unknown = h
            .send(Method::GET, "/api/v1/users/me", Some(h.bearer(999)))
            .await;

        let mut bodies = Vec::new();
        for response in [missing, malformed, garbage, unknown] {
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            bodies.push(json_body(response).await);
        }
        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(bodies[0]["message"], "authorization failed");
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let h = Harness::new(None);
        let auth = h.bearer(OWNER);

        h.send(Method::GET, "/api/v1/users/me", Some(auth.clone()))
            .await;
        h.send(Method::GET, "/api/v1/users/me", Some(auth)).await;

        assert_eq!(h.store.user_reads(), 1);
    }

    #[tokio::test]
    async fn test_owner_may_delete_own_post() {
        let h = Harness::new(None);
        let response = h
            .send(Method::DELETE, "/api/v1/posts/100", Some(h.bearer(OWNER)))
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_delete_requires_admin_for_non_owner() {
        let h = Harness::new(None);

        let response = h
            .send(Method::DELETE, "/api/v1/posts/100", Some(h.bearer(MODERATOR)))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = h
            .send(Method::DELETE, "/api/v1/posts/100", Some(h.bearer(ADMIN)))
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_update_requires_moderator_for_non_owner() {
        let h = Harness::new(None);

        let response = h
            .send(Method::PATCH, "/api/v1/posts/100", Some(h.bearer(STRANGER)))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = h
            .send(Method::PATCH, "/api/v1/posts/100", Some(h.bearer(MODERATOR)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["post_id"], POST);
        assert_eq!(body["actor_id"], MODERATOR);
    }

    #[tokio::test]
    async fn test_unknown_post_is_not_found() {
        let h = Harness::new(None);
        let response = h
            .send(Method::PATCH, "/api/v1/posts/555", Some(h.bearer(ADMIN)))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_authentication_runs_before_ownership() {
        let h = Harness::new(None);
        let response = h.send(Method::DELETE, "/api/v1/posts/555", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_rate_limit_runs_first() {
        let h = Harness::new(Some(Arc::new(RateLimiter::new(2, Duration::from_secs(60)))));

        let first = h.send(Method::GET, "/api/v1/users/me", None).await;
        assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(first.headers()["X-RateLimit-Remaining"], "1");

        let second = h.send(Method::GET, "/api/v1/users/me", None).await;
        assert_eq!(second.status(), StatusCode::UNAUTHORIZED);

        let third = h
            .send(Method::GET, "/api/v1/users/me", Some(h.bearer(OWNER)))
            .await;
        assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(third.headers().contains_key(header::RETRY_AFTER));
        let body = json_body(third).await;
        assert!(body["retry_after"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let h = Harness::new(None);
        let response = h.send(Method::GET, "/nope", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
