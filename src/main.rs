use std::sync::Arc;
use tracing::info;

use mongo_api::{
    config::{Config, StoreBackend},
    dispatcher::Dispatcher,
    store::{DocumentStore, MemoryStore, MongoStore, PoolSettings},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,mongo_api=debug"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env()?;

    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Mongo => {
            let pool = PoolSettings {
                max_pool_size: config.max_pool_size,
                min_pool_size: config.min_pool_size,
                ..PoolSettings::default()
            };
            info!("Using MongoDB at {}", config.mongodb_uri);
            Arc::new(MongoStore::connect(&config.mongodb_uri, pool).await?)
        }
        StoreBackend::Memory => {
            info!("Using in-process document store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let dispatcher = Dispatcher::new(
        store,
        config.find_namespace.clone(),
        config.bulk_namespace.clone(),
    );
    info!(
        "Reading from {} and bulk inserting into {}",
        dispatcher.find_target(),
        dispatcher.bulk_target()
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        dispatcher,
    });
    let app = mongo_api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    info!("Server starting on {}", config.server_address);

    axum::serve(listener, app).await?;

    Ok(())
}
