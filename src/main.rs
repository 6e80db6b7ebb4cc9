use std::error::Error;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use web_orders::{http, seed_if_empty, Config, OrderService, SqliteOrderStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    info!(
        addr = %config.addr,
        database = %config.database,
        environment = ?config.environment,
        "starting order service"
    );

    let store = SqliteOrderStore::open(&config.database)?;
    if config.seed {
        seed_if_empty(&store)?;
    }

    let service = Arc::new(OrderService::with_settings(store, config.service_settings()));
    http::serve(service, &config).await?;

    info!("order service stopped");
    Ok(())
}
