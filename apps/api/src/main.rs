mod analysis;
mod config;
mod db;
mod errors;
mod models;
mod providers;
mod routes;
mod settings;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::settings::{ConfigStore, MemoryConfigStore, PgConfigStore};
use crate::state::{build_analyzer, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Freelance API v{}", env!("CARGO_PKG_VERSION"));

    // Configuration store: Postgres when configured, in-memory otherwise
    let store: Arc<dyn ConfigStore> = match &config.database_url {
        Some(url) => Arc::new(PgConfigStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; model settings and API keys are kept in memory");
            Arc::new(MemoryConfigStore::new())
        }
    };

    let analyzer = build_analyzer(&config, store.as_ref()).await?;

    let state = AppState::new(store, analyzer, config.clone());

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
