/// Application context and dependency injection
use crate::{
    account::{tokens::JwtIssuer, AccountManager},
    catalog::ComponentCatalog,
    config::ServerConfig,
    dashboard::DashboardService,
    db,
    error::{InventoryError, InventoryResult},
    logs::{ErrorLogManager, SearchLogManager},
    mailer::{self, MailSender},
    reset::{token::ResetTokenGenerator, PasswordResetFlow},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub password_reset: Arc<PasswordResetFlow>,
    pub catalog: Arc<ComponentCatalog>,
    pub search_log: Arc<SearchLogManager>,
    pub error_log: Arc<ErrorLogManager>,
    pub dashboard: Arc<DashboardService>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> InventoryResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let mailer = mailer::build_mailer(&config.email)?;
        let ctx = Self::from_parts(config, db, mailer)?;

        if let Some(admin) = &ctx.config.bootstrap_admin {
            ctx.account_manager.ensure_superuser(admin).await?;
        }

        Ok(ctx)
    }

    /// Wire the services over an existing pool and mail sender
    pub fn from_parts(
        config: ServerConfig,
        db: SqlitePool,
        mailer: Arc<dyn MailSender>,
    ) -> InventoryResult<Self> {
        let auth = &config.authentication;

        let jwt = JwtIssuer::new(&auth.secret_key, auth.access_token_ttl, auth.refresh_token_ttl);
        let account_manager = Arc::new(AccountManager::new(db.clone(), jwt));

        let error_log = Arc::new(ErrorLogManager::new(db.clone()));
        let search_log = Arc::new(SearchLogManager::new(db.clone()));
        let catalog = Arc::new(ComponentCatalog::new(db.clone()));

        let reset_tokens = ResetTokenGenerator::new(&auth.secret_key, auth.password_reset_timeout)?;
        let password_reset = Arc::new(PasswordResetFlow::new(
            account_manager.clone(),
            reset_tokens,
            mailer,
            error_log.clone(),
            config.service.frontend_url.clone(),
            config.email.from_address.clone(),
        ));

        let dashboard = Arc::new(DashboardService::new(
            catalog.clone(),
            search_log.clone(),
            config.inventory.low_stock_threshold,
        ));

        Ok(Self {
            config: Arc::new(config),
            db,
            account_manager,
            password_reset,
            catalog,
            search_log,
            error_log,
            dashboard,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> InventoryResult<()> {
        let dir = &config.storage.data_directory;
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                InventoryError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }

        Ok(())
    }

    /// In-memory context with a recording mailer
    #[cfg(test)]
    pub async fn for_tests(mailer: Arc<dyn MailSender>) -> Self {
        Self::from_parts(ServerConfig::for_tests(), db::test_pool().await, mailer).unwrap()
    }
}
