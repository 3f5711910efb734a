use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use city_explorer_server::{
    aggregator::Aggregator,
    config::Config,
    database::LocationStore,
    routes::{create_router, AppState},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "city_explorer_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let durable = match &config.database_url {
        Some(url) => open_durable_tier(url, &config).await,
        None => {
            tracing::info!("DATABASE_URL not set, locations are cached in-process only");
            None
        }
    };

    let aggregator = Arc::new(Aggregator::new(&config, durable)?);
    let state = AppState {
        aggregator: aggregator.clone(),
    };

    let app = create_router(state).layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server starting on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    aggregator.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

/// A durable tier that cannot be reached is logged and skipped, never fatal.
async fn open_durable_tier(url: &str, config: &Config) -> Option<LocationStore> {
    let store = match LocationStore::connect(url, config.upstream_timeout).await {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!("Durable tier unavailable, continuing without it: {}", e);
            return None;
        }
    };

    if let Err(e) = store.init_tables().await {
        tracing::warn!("Durable tier schema setup failed, continuing without it: {}", e);
        store.close().await;
        return None;
    }

    tracing::info!("Durable location tier connected");
    Some(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
