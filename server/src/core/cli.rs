use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::CacheBackendType;
use super::constants::{
    ENV_BASIC_PASSWORD, ENV_BASIC_USERNAME, ENV_CACHE_BACKEND, ENV_CACHE_MAX_ENTRIES,
    ENV_CACHE_REDIS_URL, ENV_CONFIG, ENV_DATABASE_URL, ENV_HOST, ENV_JWT_EXPIRY_SECS,
    ENV_JWT_ISSUER, ENV_JWT_SECRET, ENV_PORT, ENV_RATE_LIMIT_ENABLED, ENV_RATE_LIMIT_REQUESTS,
    ENV_RATE_LIMIT_WINDOW_SECS, ENV_REQUEST_TIMEOUT_SECS,
};

#[derive(Parser)]
#[command(name = "socialfeed")]
#[command(version, about = "Social feed API server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Per-request deadline in seconds
    #[arg(long, global = true, env = ENV_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: Option<u64>,

    /// PostgreSQL connection URL (in-memory store when unset)
    #[arg(long, global = true, env = ENV_DATABASE_URL)]
    pub database_url: Option<String>,

    // Cache options
    /// Cache backend (memory or redis)
    #[arg(long, global = true, env = ENV_CACHE_BACKEND, value_parser = parse_cache_backend_type)]
    pub cache_backend: Option<CacheBackendType>,

    /// Maximum number of cache entries
    #[arg(long, global = true, env = ENV_CACHE_MAX_ENTRIES)]
    pub cache_max_entries: Option<u64>,

    /// Redis-compatible cache URL (redis://host:port/db)
    #[arg(long, global = true, env = ENV_CACHE_REDIS_URL)]
    pub cache_redis_url: Option<String>,

    // Auth options
    /// Shared secret used to sign bearer tokens
    #[arg(long, global = true, env = ENV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token issuer, also used as the expected audience
    #[arg(long, global = true, env = ENV_JWT_ISSUER)]
    pub jwt_issuer: Option<String>,

    /// Token lifetime in seconds
    #[arg(long, global = true, env = ENV_JWT_EXPIRY_SECS)]
    pub jwt_expiry_secs: Option<u64>,

    /// Username for operational endpoints
    #[arg(long, global = true, env = ENV_BASIC_USERNAME)]
    pub basic_username: Option<String>,

    /// Password for operational endpoints
    #[arg(long, global = true, env = ENV_BASIC_PASSWORD, hide_env_values = true)]
    pub basic_password: Option<String>,

    // Rate limit options
    /// Enable or disable rate limiting
    #[arg(long, global = true, env = ENV_RATE_LIMIT_ENABLED)]
    pub rate_limit_enabled: Option<bool>,

    /// Requests admitted per client per window
    #[arg(long, global = true, env = ENV_RATE_LIMIT_REQUESTS)]
    pub rate_limit_requests: Option<u32>,

    /// Rate limit window in seconds
    #[arg(long, global = true, env = ENV_RATE_LIMIT_WINDOW_SECS)]
    pub rate_limit_window_secs: Option<u64>,
}

/// Parse cache backend type from CLI/env string
fn parse_cache_backend_type(s: &str) -> Result<CacheBackendType, String> {
    match s.to_lowercase().as_str() {
        "memory" => Ok(CacheBackendType::Memory),
        "redis" => Ok(CacheBackendType::Redis),
        _ => Err(format!(
            "Invalid cache backend '{}'. Valid options: memory, redis",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Serve,
    /// Sign a bearer token for a user (operational tooling)
    Token {
        /// Principal ID placed in the `sub` claim
        #[arg(long)]
        user_id: i64,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub database_url: Option<String>,
    pub cache_backend: Option<CacheBackendType>,
    pub cache_max_entries: Option<u64>,
    pub cache_redis_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_issuer: Option<String>,
    pub jwt_expiry_secs: Option<u64>,
    pub basic_username: Option<String>,
    pub basic_password: Option<String>,
    pub rate_limit_enabled: Option<bool>,
    pub rate_limit_requests: Option<u32>,
    pub rate_limit_window_secs: Option<u64>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        request_timeout_secs: cli.request_timeout_secs,
        database_url: cli.database_url,
        cache_backend: cli.cache_backend,
        cache_max_entries: cli.cache_max_entries,
        cache_redis_url: cli.cache_redis_url,
        jwt_secret: cli.jwt_secret,
        jwt_issuer: cli.jwt_issuer,
        jwt_expiry_secs: cli.jwt_expiry_secs,
        basic_username: cli.basic_username,
        basic_password: cli.basic_password,
        rate_limit_enabled: cli.rate_limit_enabled,
        rate_limit_requests: cli.rate_limit_requests,
        rate_limit_window_secs: cli.rate_limit_window_secs,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cache_backend_type() {
        assert_eq!(
            parse_cache_backend_type("Redis").unwrap(),
            CacheBackendType::Redis
        );
        assert_eq!(
            parse_cache_backend_type("memory").unwrap(),
            CacheBackendType::Memory
        );
        assert!(parse_cache_backend_type("memcached").is_err());
    }

    #[test]
    fn test_token_subcommand() {
        let cli = Cli::try_parse_from(["socialfeed", "token", "--user-id", "42"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Token { user_id: 42 })));
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["socialfeed", "--port", "9000"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.port, Some(9000));
    }
}
