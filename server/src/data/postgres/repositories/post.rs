//! Post ownership queries

use sqlx::PgPool;

use crate::data::error::DataError;
use crate::data::postgres::map_sqlx_error;

/// Get the id of the user who created a post
pub async fn get_owner(pool: &PgPool, post_id: i64) -> Result<Option<i64>, DataError> {
    let owner: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;

    Ok(owner.map(|(user_id,)| user_id))
}
