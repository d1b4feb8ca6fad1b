use std::sync::Arc;

use anyhow::{Context, Result};

use spotmatch::config::AppConfig;
use spotmatch::db::Database;
use spotmatch::events::EventPublisher;
use spotmatch::gateway::{self, state::AppState};
use spotmatch::logging;
use spotmatch::user_auth::UserAuthService;
use spotmatch::websocket::ChannelRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    let env = std::env::var("SPOTMATCH_ENV").unwrap_or_else(|_| "default".to_string());
    let config = AppConfig::load(&env)?;
    let _log_guard = logging::init_logging(&config);

    tracing::info!("spotmatch starting (env {}, build {})", env, env!("GIT_HASH"));

    let db = Database::connect(&config.postgres_url, config.postgres_pool_size)
        .await
        .context("Failed to connect to PostgreSQL")?;
    if config.run_migrations {
        db.migrate().await.context("Failed to apply migrations")?;
        tracing::info!("Migrations applied");
    }

    let channels = Arc::new(ChannelRegistry::new());
    let publisher = EventPublisher::new(channels.clone());
    let auth = UserAuthService::new(db.pool().clone(), config.auth.clone());

    let state = Arc::new(AppState {
        db,
        auth,
        channels,
        publisher,
    });

    gateway::run_server(&config.gateway, state).await;
    Ok(())
}
