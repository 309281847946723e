//! Error type for the data layer

use thiserror::Error;

/// Error type for repository operations
#[derive(Error, Debug)]
pub enum DataError {
    /// Requested record does not exist
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Database driver error
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Could not obtain a connection in time
    #[error("Query timeout after {timeout_secs}s on {backend}")]
    Timeout {
        backend: &'static str,
        timeout_secs: u64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DataError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn timeout(backend: &'static str, timeout_secs: u64) -> Self {
        Self::Timeout {
            backend,
            timeout_secs,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = DataError::not_found("user", 42);
        assert_eq!(err.to_string(), "user not found: 42");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_timeout_display() {
        let err = DataError::timeout("postgres", 30);
        assert_eq!(err.to_string(), "Query timeout after 30s on postgres");
        assert!(!err.is_not_found());
    }
}
