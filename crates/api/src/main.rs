use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use domain::services::SystemClock;
use domain::store::memory::InMemoryCampaignStore;
use domain::CampaignStore;
use loot_tracker_api::{
    app::{create_app, AppState},
    config::Config,
    middleware,
    services::EmailService,
};
use persistence::PgCampaignStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting Loot Tracker API v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn CampaignStore> = if config.store.is_memory() {
        info!("Using in-memory campaign store; data is lost on restart");
        Arc::new(InMemoryCampaignStore::new())
    } else {
        let db_config = persistence::db::DatabaseConfig::from(&config.database);
        let pool = persistence::db::create_pool(&db_config).await?;

        info!("Running database migrations...");
        persistence::run_migrations(&pool).await?;
        info!("Migrations completed");

        Arc::new(PgCampaignStore::new(pool))
    };

    let notifier = Arc::new(EmailService::new(config.email.clone())?);
    let addr = config.socket_addr()?;

    let state = AppState::new(config, store, notifier, Arc::new(SystemClock))?;
    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
