//! User endpoints

use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::CurrentUser;
use crate::data::Principal;

pub fn routes() -> Router<()> {
    Router::new().route("/api/v1/users/me", get(get_current_user))
}

/// The authenticated principal as resolved by the gate
pub async fn get_current_user(user: CurrentUser) -> Json<Principal> {
    Json(Principal::clone(&user))
}
