// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "socialfeed";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "socialfeed.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "SOCIALFEED_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "SOCIALFEED_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "SOCIALFEED_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "SOCIALFEED_LOG";

/// Environment variable for the per-request deadline
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "SOCIALFEED_REQUEST_TIMEOUT_SECS";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 8080;

/// Default request deadline in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// Environment Variables - Database
// =============================================================================

/// PostgreSQL connection URL. Without it the in-memory store is used.
pub const ENV_DATABASE_URL: &str = "SOCIALFEED_DATABASE_URL";

/// Default pool size for PostgreSQL
pub const POSTGRES_DEFAULT_MAX_CONNECTIONS: u32 = 30;

/// Default acquire timeout for PostgreSQL connections
pub const POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout for PostgreSQL connections (15 minutes)
pub const POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS: u64 = 900;

// =============================================================================
// Environment Variables - Cache
// =============================================================================

pub const ENV_CACHE_BACKEND: &str = "SOCIALFEED_CACHE_BACKEND";
pub const ENV_CACHE_REDIS_URL: &str = "SOCIALFEED_CACHE_REDIS_URL";
pub const ENV_CACHE_MAX_ENTRIES: &str = "SOCIALFEED_CACHE_MAX_ENTRIES";

/// Default maximum entries for the in-memory cache
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 10_000;

/// TTL for cached user snapshots
pub const CACHE_TTL_USER_SECS: u64 = 60;

/// Redis pool size
pub const REDIS_POOL_MAX_SIZE: usize = 32;

/// Redis pool wait/create/recycle timeout
pub const REDIS_POOL_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// Environment Variables - Auth
// =============================================================================

pub const ENV_JWT_SECRET: &str = "SOCIALFEED_JWT_SECRET";
pub const ENV_JWT_ISSUER: &str = "SOCIALFEED_JWT_ISSUER";
pub const ENV_JWT_EXPIRY_SECS: &str = "SOCIALFEED_JWT_EXPIRY_SECS";
pub const ENV_BASIC_USERNAME: &str = "SOCIALFEED_BASIC_USERNAME";
pub const ENV_BASIC_PASSWORD: &str = "SOCIALFEED_BASIC_PASSWORD";

/// Default token issuer (also used as audience)
pub const DEFAULT_JWT_ISSUER: &str = "socialfeed";

/// Default token lifetime (3 days)
pub const DEFAULT_JWT_EXPIRY_SECS: u64 = 3 * 24 * 60 * 60;

/// Default operational username for basic auth
pub const DEFAULT_BASIC_USERNAME: &str = "admin";

// =============================================================================
// Environment Variables - Rate Limiting
// =============================================================================

pub const ENV_RATE_LIMIT_ENABLED: &str = "SOCIALFEED_RATE_LIMIT_ENABLED";
pub const ENV_RATE_LIMIT_REQUESTS: &str = "SOCIALFEED_RATE_LIMIT_REQUESTS";
pub const ENV_RATE_LIMIT_WINDOW_SECS: &str = "SOCIALFEED_RATE_LIMIT_WINDOW_SECS";

/// Default number of requests admitted per window
pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 20;

/// Default rate limit window in seconds
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 5;

// =============================================================================
// Roles
// =============================================================================

/// Role required to delete another user's post
pub const ROLE_ADMIN: &str = "admin";

/// Role required to edit another user's post
pub const ROLE_MODERATOR: &str = "moderator";

/// Baseline role for new accounts
pub const ROLE_USER: &str = "user";

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum time to wait for background tasks during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;
