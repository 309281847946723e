//! Core application

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::api::auth::{BasicCredentialGate, OwnershipAuthorizer, TokenAuthenticator};
use crate::api::{ApiContext, ApiServer};
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, CACHE_TTL_USER_SECS, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::cache::{self, UserCache};
use crate::data::{MemoryStore, PostgresStore, RateLimiter, Repositories};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    /// `None` when running on the in-memory store
    pub postgres: Option<Arc<PostgresStore>>,
    pub tokens: Arc<TokenAuthenticator>,
    pub users: UserCache,
    pub authorizer: OwnershipAuthorizer,
    pub basic: BasicCredentialGate,
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Token { user_id }) => return Self::print_token(&cli_config, user_id),
            Some(Commands::Serve) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    fn print_token(cli: &CliConfig, user_id: i64) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let tokens = TokenAuthenticator::new(&config.auth.token);
        let token = tokens
            .issue_for(user_id)
            .context("Failed to sign token")?;
        println!("{token}");
        Ok(())
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let shutdown = ShutdownService::new();

        let (repos, postgres) = match config.database.url {
            Some(_) => {
                let store = Arc::new(
                    PostgresStore::init(&config.database)
                        .await
                        .context("Failed to initialize PostgreSQL store")?,
                );
                (Repositories::from_store(store.clone()), Some(store))
            }
            None => {
                tracing::warn!("No database URL configured, using the in-memory store");
                (Repositories::from_store(Arc::new(MemoryStore::new())), None)
            }
        };

        let backend = cache::connect(&config.cache)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize cache: {}", e))?;
        let users = UserCache::new(
            backend,
            repos.users.clone(),
            Duration::from_secs(CACHE_TTL_USER_SECS),
        );
        tracing::debug!(backend = users.backend_name(), "Cache initialized");

        let rate_limiter = if config.rate_limit.enabled {
            let limiter = Arc::new(RateLimiter::new(
                config.rate_limit.requests,
                config.rate_limit.window,
            ));
            shutdown
                .register(limiter.start_sweeper(shutdown.token()))
                .await;
            tracing::debug!(
                requests = limiter.limit(),
                window_secs = limiter.window().as_secs(),
                "Rate limiter initialized"
            );
            Some(limiter)
        } else {
            tracing::debug!("Rate limiting disabled by config");
            None
        };

        let tokens = Arc::new(TokenAuthenticator::new(&config.auth.token));
        let authorizer = OwnershipAuthorizer::new(
            repos.roles.clone(),
            repos.posts.clone(),
            config.server.request_timeout,
        );
        let basic = BasicCredentialGate::new(&config.auth.basic);

        Ok(Self {
            shutdown,
            config,
            postgres,
            tokens,
            users,
            authorizer,
            basic,
            rate_limiter,
        })
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    fn api_context(&self) -> ApiContext {
        ApiContext {
            tokens: self.tokens.clone(),
            users: self.users.clone(),
            authorizer: self.authorizer.clone(),
            basic: self.basic.clone(),
            rate_limiter: self.rate_limiter.clone(),
            request_timeout: self.config.server.request_timeout,
        }
    }

    async fn start_server(app: Self) -> Result<()> {
        // Signal handlers go in before the listener binds
        app.shutdown.install_signal_handlers();

        let server = ApiServer::new(&app.api_context(), &app.config.server)?;
        let result = server.start(app.shutdown.wait()).await;

        app.shutdown.shutdown().await;
        if let Some(postgres) = &app.postgres {
            postgres.close().await;
        }

        result
    }
}
