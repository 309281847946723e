//! Health check endpoint (operational, basic auth)

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::data::cache::UserCache;

#[derive(Serialize)]
pub struct CacheHealth {
    pub backend: &'static str,
    pub healthy: bool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub cache: CacheHealth,
}

#[derive(Clone)]
pub struct HealthState {
    pub users: UserCache,
}

pub fn routes(users: UserCache) -> Router<()> {
    Router::new()
        .route("/api/v1/health", get(health))
        .with_state(HealthState { users })
}

/// Reports `degraded` rather than failing when the cache is down; the store
/// still serves every lookup in that case.
pub async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    let healthy = match state.users.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Cache health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        cache: CacheHealth {
            backend: state.users.backend_name(),
            healthy,
        },
    })
}
