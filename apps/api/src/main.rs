mod config;
mod errors;
mod extract;
mod form;
mod models;
mod routes;
mod session;
mod state;
mod transfer;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extract::build_extractor;
use crate::routes::build_router;
use crate::session::SessionRegistry;
use crate::state::AppState;
use crate::transfer::{KvStore, MemoryStore, RedisStore};

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

    info!("Starting wizard API v{}", env!("CARGO_PKG_VERSION"));

    let extractor = build_extractor(&config);
    info!(
        "Extractor: {:?} ({})",
        config.extractor_mode, config.extractor_base_url
    );

    let kv = build_store(&config)?;
    let session_ttl = Duration::from_secs(config.session_ttl_secs);

    let state = AppState {
        config: config.clone(),
        extractor,
        kv,
        sessions: SessionRegistry::with_ttl(session_ttl),
    };

    spawn_session_sweeper(state.clone(), session_ttl);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Redis when configured, otherwise slots live in this process.
fn build_store(config: &Config) -> Result<Arc<dyn KvStore>> {
    match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!(
                "Transfer store: Redis (expiry {}s)",
                config.session_ttl_secs
            );
            Ok(Arc::new(RedisStore::new(client, config.session_ttl_secs)))
        }
        None => {
            info!("Transfer store: in-memory");
            Ok(Arc::new(MemoryStore::with_ttl(Duration::from_secs(
                config.session_ttl_secs,
            ))))
        }
    }
}

/// Periodically drops sessions nobody has touched within `ttl`.
fn spawn_session_sweeper(state: AppState, ttl: Duration) {
    let period = (ttl / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            state.evict_expired_sessions().await;
        }
    });
}
