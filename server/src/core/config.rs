use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    CONFIG_FILE_NAME, DEFAULT_BASIC_USERNAME, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_HOST,
    DEFAULT_JWT_EXPIRY_SECS, DEFAULT_JWT_ISSUER, DEFAULT_PORT, DEFAULT_RATE_LIMIT_REQUESTS,
    DEFAULT_RATE_LIMIT_WINDOW_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
    POSTGRES_DEFAULT_MAX_CONNECTIONS,
};

// =============================================================================
// Cache Backend Enum
// =============================================================================

/// Cache backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendType {
    #[default]
    Memory,
    Redis,
}

impl fmt::Display for CacheBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackendType::Memory => write!(f, "memory"),
            CacheBackendType::Redis => write!(f, "redis"),
        }
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub request_timeout_secs: Option<u64>,
}

/// Database configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    /// PostgreSQL connection URL (or use SOCIALFEED_DATABASE_URL env var)
    pub url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: Option<u32>,
}

/// Cache configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CacheFileConfig {
    /// Cache backend: memory (default) or redis
    pub backend: Option<CacheBackendType>,
    /// Connection URL for Redis-compatible backends
    pub redis_url: Option<String>,
    /// Maximum number of entries (memory backend)
    pub max_entries: Option<u64>,
}

/// Bearer token section (nested under auth)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TokenFileConfig {
    pub secret: Option<String>,
    pub issuer: Option<String>,
    pub expiry_secs: Option<u64>,
}

/// Basic credential section (nested under auth)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BasicFileConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Authentication configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthFileConfig {
    pub token: Option<TokenFileConfig>,
    pub basic: Option<BasicFileConfig>,
}

/// Rate limit configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RateLimitFileConfig {
    pub enabled: Option<bool>,
    pub requests: Option<u32>,
    pub window_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    pub cache: Option<CacheFileConfig>,
    pub auth: Option<AuthFileConfig>,
    pub rate_limit: Option<RateLimitFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra {
            if map.is_empty() {
                return;
            }
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Runtime Config Structs
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline applied to every request
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; `None` selects the in-memory store
    pub url: Option<String>,
    pub max_connections: u32,
}

/// Cache configuration (used by the cache backend factory)
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Cache backend type
    pub backend: CacheBackendType,
    /// Maximum entries (memory backend)
    pub max_entries: u64,
    /// Redis URL (redis backend)
    pub redis_url: Option<String>,
}

#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    /// Expected `iss` and `aud`
    pub issuer: String,
    pub expiry: Duration,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"***")
            .field("issuer", &self.issuer)
            .field("expiry", &self.expiry)
            .finish()
    }
}

#[derive(Clone)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token: TokenConfig,
    pub basic: BasicAuthConfig,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests admitted per client per window
    pub requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let path = match cli.config {
            Some(ref path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.clone())
            }
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                if local.exists() { Some(local) } else { None }
            }
        };

        let file_config = match path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => FileConfig::default(),
        };

        let config = Self::resolve(file_config, cli);
        config.validate()?;
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn resolve(file_config: FileConfig, cli: &CliConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();
        let file_cache = file_config.cache.unwrap_or_default();
        let file_auth = file_config.auth.unwrap_or_default();
        let file_token = file_auth.token.unwrap_or_default();
        let file_basic = file_auth.basic.unwrap_or_default();
        let file_rate_limit = file_config.rate_limit.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
            request_timeout: Duration::from_secs(
                cli.request_timeout_secs
                    .or(file_server.request_timeout_secs)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        };

        let database = DatabaseConfig {
            url: cli
                .database_url
                .clone()
                .or(file_database.url)
                .filter(|u| !u.is_empty()),
            max_connections: file_database
                .max_connections
                .unwrap_or(POSTGRES_DEFAULT_MAX_CONNECTIONS),
        };

        let cache = CacheConfig {
            backend: cli.cache_backend.or(file_cache.backend).unwrap_or_default(),
            max_entries: cli
                .cache_max_entries
                .or(file_cache.max_entries)
                .unwrap_or(DEFAULT_CACHE_MAX_ENTRIES),
            redis_url: cli.cache_redis_url.clone().or(file_cache.redis_url),
        };

        let auth = AuthConfig {
            token: TokenConfig {
                secret: cli
                    .jwt_secret
                    .clone()
                    .or(file_token.secret)
                    .unwrap_or_default(),
                issuer: cli
                    .jwt_issuer
                    .clone()
                    .or(file_token.issuer)
                    .unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string()),
                expiry: Duration::from_secs(
                    cli.jwt_expiry_secs
                        .or(file_token.expiry_secs)
                        .unwrap_or(DEFAULT_JWT_EXPIRY_SECS),
                ),
            },
            basic: BasicAuthConfig {
                username: cli
                    .basic_username
                    .clone()
                    .or(file_basic.username)
                    .unwrap_or_else(|| DEFAULT_BASIC_USERNAME.to_string()),
                password: cli
                    .basic_password
                    .clone()
                    .or(file_basic.password)
                    .unwrap_or_default(),
            },
        };

        let rate_limit = RateLimitConfig {
            enabled: cli
                .rate_limit_enabled
                .or(file_rate_limit.enabled)
                .unwrap_or(true),
            requests: cli
                .rate_limit_requests
                .or(file_rate_limit.requests)
                .unwrap_or(DEFAULT_RATE_LIMIT_REQUESTS),
            window: Duration::from_secs(
                cli.rate_limit_window_secs
                    .or(file_rate_limit.window_secs)
                    .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            ),
        };

        tracing::trace!(
            host = %server.host,
            port = server.port,
            cache = %cache.backend,
            postgres = database.url.is_some(),
            rate_limit = rate_limit.enabled,
            "Resolved configuration"
        );

        Self {
            server,
            database,
            cache,
            auth,
            rate_limit,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.auth.token.secret.is_empty() {
            anyhow::bail!("JWT secret is required (--jwt-secret or SOCIALFEED_JWT_SECRET)");
        }
        if self.auth.basic.password.is_empty() {
            anyhow::bail!(
                "Basic auth password is required (--basic-password or SOCIALFEED_BASIC_PASSWORD)"
            );
        }
        if self.cache.backend == CacheBackendType::Redis && self.cache.redis_url.is_none() {
            anyhow::bail!("Redis cache backend requires a URL (--cache-redis-url)");
        }
        if self.rate_limit.requests == 0 {
            anyhow::bail!("Rate limit requests must be at least 1");
        }
        if self.rate_limit.window.is_zero() {
            anyhow::bail!("Rate limit window must be at least 1 second");
        }
        if self.server.request_timeout.is_zero() {
            anyhow::bail!("Request timeout must be at least 1 second");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with_secrets() -> CliConfig {
        CliConfig {
            jwt_secret: Some("secret".to_string()),
            basic_password: Some("pass".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::resolve(FileConfig::default(), &cli_with_secrets());
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.cache.backend, CacheBackendType::Memory);
        assert_eq!(config.auth.token.issuer, DEFAULT_JWT_ISSUER);
        assert_eq!(config.auth.basic.username, DEFAULT_BASIC_USERNAME);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.requests, DEFAULT_RATE_LIMIT_REQUESTS);
        assert!(config.database.url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_values_applied() {
        let file = FileConfig::parse(
            r#"{
                "server": { "port": 9090 },
                "cache": { "backend": "redis", "redis_url": "redis://localhost:6379" },
                "rate_limit": { "requests": 3, "window_secs": 1 }
            }"#,
        )
        .unwrap();
        let config = AppConfig::resolve(file, &cli_with_secrets());
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.cache.backend, CacheBackendType::Redis);
        assert_eq!(config.rate_limit.requests, 3);
        assert_eq!(config.rate_limit.window, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig::parse(r#"{ "server": { "port": 9090, "host": "0.0.0.0" } }"#).unwrap();
        let cli = CliConfig {
            port: Some(7000),
            ..cli_with_secrets()
        };
        let config = AppConfig::resolve(file, &cli);
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_unknown_fields_collected() {
        let file = FileConfig::parse(r#"{ "sever": { "port": 1 } }"#).unwrap();
        match file.extra {
            serde_json::Value::Object(map) => assert!(map.contains_key("sever")),
            other => panic!("unexpected extra: {other:?}"),
        }
    }

    #[test]
    fn test_missing_secret_rejected() {
        let config = AppConfig::resolve(FileConfig::default(), &CliConfig::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redis_without_url_rejected() {
        let cli = CliConfig {
            cache_backend: Some(CacheBackendType::Redis),
            ..cli_with_secrets()
        };
        let config = AppConfig::resolve(FileConfig::default(), &cli);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let cli = CliConfig {
            rate_limit_requests: Some(0),
            ..cli_with_secrets()
        };
        let config = AppConfig::resolve(FileConfig::default(), &cli);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_masks_secrets() {
        let config = AppConfig::resolve(FileConfig::default(), &cli_with_secrets());
        let debug = format!("{:?}", config.auth);
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("***"));
    }
}
