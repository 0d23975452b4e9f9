//! rl-accounts service - HTTP API for accounts, payment methods and plans
//!
//! This is the main entry point for the rl-accounts service.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rl_accounts_service::{create_router, seed_plans, AppState, ServiceConfig};
use rl_accounts_store::{MemoryStore, PlanCatalog, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rl_accounts=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rl-accounts service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = ?config.data_dir,
        stripe_configured = %config.stripe_api_key.is_some(),
        upstream_configured = %config.upstream_url.is_some(),
        "Service configuration loaded"
    );

    let (store, plans) = open_storage(&config)?;

    if let Some(path) = &config.plans_file {
        let count = seed_plans(plans.as_ref(), path)?;
        tracing::info!(path = %path, count, "Plan catalog seeded");
    }

    let state = AppState::new(store, plans, config.clone());
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
    })
    .await?;

    Ok(())
}

type Storage = (Arc<dyn Store>, Arc<dyn PlanCatalog>);

#[cfg(feature = "rocksdb-backend")]
fn open_storage(config: &ServiceConfig) -> Result<Storage, Box<dyn std::error::Error>> {
    if let Some(dir) = &config.data_dir {
        tracing::info!(path = %dir, "Opening RocksDB store");
        let store = Arc::new(rl_accounts_store::RocksStore::open(dir)?);
        return Ok((Arc::clone(&store) as Arc<dyn Store>, store));
    }
    Ok(memory_storage())
}

#[cfg(not(feature = "rocksdb-backend"))]
#[allow(clippy::unnecessary_wraps)]
fn open_storage(config: &ServiceConfig) -> Result<Storage, Box<dyn std::error::Error>> {
    if config.data_dir.is_some() {
        tracing::warn!("DATA_DIR set but built without rocksdb-backend - ignoring");
    }
    Ok(memory_storage())
}

fn memory_storage() -> Storage {
    tracing::warn!("Using in-memory storage - data is lost on restart");
    let store = Arc::new(MemoryStore::new());
    (Arc::clone(&store) as Arc<dyn Store>, store)
}
