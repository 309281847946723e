//! User queries

use sqlx::PgPool;

use crate::data::error::DataError;
use crate::data::models::{Principal, Role};
use crate::data::postgres::map_sqlx_error;

type UserRoleRow = (i64, String, String, bool, i64, String, String, i32);

/// Get a user with its role joined in
pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<Principal>, DataError> {
    let row: Option<UserRoleRow> = sqlx::query_as(
        "SELECT u.id, u.username, u.email, u.is_active, \
                r.id, r.name, COALESCE(r.description, ''), r.level \
         FROM users u JOIN roles r ON u.role_id = r.id \
         WHERE u.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;

    Ok(row.map(
        |(id, username, email, is_active, role_id, name, description, level)| Principal {
            id,
            username,
            email,
            is_active,
            role: Role {
                id: role_id,
                name,
                description,
                level,
            },
        },
    ))
}
