use std::sync::Arc;

use vidhive::api::account_service::AccountService;
use vidhive::api::auth_service::AuthService;
use vidhive::api::server::{ApiServer, AppState};
use vidhive::api::tokens::TokenService;
use vidhive::config::AppConfig;
use vidhive::database;
use vidhive::database::repositories::{SqlxUserRepository, UserRepository};
use vidhive::logging;
use vidhive::media::{AssetHostClient, MediaStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Keep the file appender guard alive for the process lifetime
    let _log_guard = logging::init_logging(config.log_dir.as_deref())?;

    // Initialize database
    let pool = database::init_pool(&config.database_url).await?;
    database::run_migrations(&pool).await?;

    // Wire services from the one configuration object
    let users: Arc<dyn UserRepository> = Arc::new(SqlxUserRepository::new(pool));
    let media: Arc<dyn MediaStorage> = Arc::new(AssetHostClient::new(config.media.clone())?);
    let token_service = Arc::new(TokenService::new(&config.tokens));
    let auth_service = Arc::new(AuthService::new(
        users.clone(),
        token_service.clone(),
        config.auth.clone(),
    ));
    let account_service = Arc::new(AccountService::new(
        users.clone(),
        media,
        config.auth.clone(),
    ));

    let state = AppState::new(token_service, auth_service, account_service, users);
    let server = ApiServer::with_state(config.server.clone(), state);

    let cancel_token = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            cancel_token.cancel();
        }
    });

    server.run().await?;

    Ok(())
}
