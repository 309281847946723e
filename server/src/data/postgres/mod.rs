//! PostgreSQL store
//!
//! Reads users, roles and post ownership from the tables owned by the feed
//! service. Schema management lives with that service, not here.

pub mod repositories;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use tracing::log::LevelFilter;

use crate::core::config::DatabaseConfig;
use crate::core::constants::{
    POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS, POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS,
    POSTGRES_DEFAULT_MAX_CONNECTIONS,
};
use crate::data::error::DataError;
use crate::data::models::{Principal, Role};
use crate::data::traits::{PostRepository, RoleRepository, UserRepository};

const BACKEND: &str = "postgres";

/// Store backed by a PostgreSQL connection pool
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect the pool described by `config`
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DataError> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DataError::Config("PostgreSQL URL is required".into()))?;

        let max_connections = if config.max_connections > 0 {
            config.max_connections
        } else {
            POSTGRES_DEFAULT_MAX_CONNECTIONS
        };

        let options: PgConnectOptions = url
            .parse()
            .map_err(|e| DataError::Config(format!("Invalid PostgreSQL URL: {}", e)))?;
        let options = options.log_statements(LevelFilter::Trace);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(Duration::from_secs(POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS))
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        tracing::debug!(max_connections, "PostgreSQL store initialized");
        Ok(Self { pool })
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("PostgreSQL pool closed");
    }
}

/// Map driver errors, surfacing pool exhaustion as a timeout
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> DataError {
    match err {
        sqlx::Error::PoolTimedOut => {
            DataError::timeout(BACKEND, POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS)
        }
        other => DataError::Database(other),
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    async fn get_by_id(&self, id: i64) -> Result<Principal, DataError> {
        repositories::user::get_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| DataError::not_found("user", id))
    }
}

#[async_trait]
impl RoleRepository for PostgresStore {
    async fn get_by_name(&self, name: &str) -> Result<Role, DataError> {
        repositories::role::get_by_name(&self.pool, name)
            .await?
            .ok_or_else(|| DataError::not_found("role", name))
    }
}

#[async_trait]
impl PostRepository for PostgresStore {
    async fn get_owner(&self, post_id: i64) -> Result<i64, DataError> {
        repositories::post::get_owner(&self.pool, post_id)
            .await?
            .ok_or_else(|| DataError::not_found("post", post_id))
    }
}
