use std::sync::Arc;

use recommendations_api::{
    api::{create_router, AppState},
    config::{Config, StoreBackend},
    db::{self, MemoryRecommendationStore, PgRecommendationStore, RecommendationStore},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("recommendations_api=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn RecommendationStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database_url, config.max_connections).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Connected to PostgreSQL and applied migrations");
            Arc::new(PgRecommendationStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            Arc::new(MemoryRecommendationStore::new())
        }
    };

    if config.enable_test_routes {
        tracing::warn!("Test routes enabled");
    }

    let app = create_router(AppState::with_store(store), config.enable_test_routes);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
