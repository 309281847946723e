//! Mutating post endpoints
//!
//! Each method is wrapped by the ownership guard with its own required role:
//! deleting someone else's post takes an admin, editing one a moderator.
//! Post persistence belongs to the feed service; these handlers only
//! acknowledge an authorized action.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, patch};
use axum::{Json, Router};
use serde::Serialize;

use crate::api::auth::{CurrentUser, OwnershipAuthorizer, require_ownership};
use crate::core::constants::{ROLE_ADMIN, ROLE_MODERATOR};

const POST_PATH: &str = "/api/v1/posts/{post_id}";

#[derive(Debug, Serialize)]
pub struct PostActionResponse {
    pub post_id: i64,
    pub action: &'static str,
    pub actor_id: i64,
}

pub fn routes(authorizer: &OwnershipAuthorizer) -> Router<()> {
    Router::new()
        .route(
            POST_PATH,
            delete(delete_post).route_layer(from_fn_with_state(
                authorizer.wrap(ROLE_ADMIN),
                require_ownership,
            )),
        )
        .route(
            POST_PATH,
            patch(update_post).route_layer(from_fn_with_state(
                authorizer.wrap(ROLE_MODERATOR),
                require_ownership,
            )),
        )
}

pub async fn delete_post(Path(post_id): Path<i64>, user: CurrentUser) -> StatusCode {
    tracing::info!(post_id, actor_id = user.id, "Post delete authorized");
    StatusCode::NO_CONTENT
}

pub async fn update_post(Path(post_id): Path<i64>, user: CurrentUser) -> Json<PostActionResponse> {
    tracing::info!(post_id, actor_id = user.id, "Post update authorized");
    Json(PostActionResponse {
        post_id,
        action: "updated",
        actor_id: user.id,
    })
}
