//! Role queries

use sqlx::PgPool;

use crate::data::error::DataError;
use crate::data::models::Role;
use crate::data::postgres::map_sqlx_error;

/// Get a role by its unique name
pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<Role>, DataError> {
    let row: Option<(i64, String, String, i32)> = sqlx::query_as(
        "SELECT id, name, COALESCE(description, ''), level FROM roles WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;

    Ok(row.map(|(id, name, description, level)| Role {
        id,
        name,
        description,
        level,
    }))
}
