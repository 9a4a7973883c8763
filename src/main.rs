use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

mod auth;
mod config;
mod db;
mod dto;
mod error;
mod extract;
mod handlers;
mod models;
mod routes;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;
use db::{MemoryStore, PgStore, Store};
use services::ai::AiGateway;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub ai: AiGateway,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> anyhow::Result<Self> {
        Ok(Self {
            ai: AiGateway::new(&config)?,
            store,
            config: Arc::new(config),
            rate_limiter: RateLimitState::default(),
        })
    }
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using in-memory storage; data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = db::pool::create_pool(database_url)
        .await
        .context("Failed to create database pool")?;

    db::pool::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations applied");
    Ok(Arc::new(PgStore::new(pool)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindpulse_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env()?;
    let store = connect_store(&config).await?;
    let state = AppState::new(config, store)?;

    match state.ai.masked_key() {
        Some(masked) => tracing::info!(key = %masked, model = %state.config.ai_model, "AI gateway configured"),
        None => tracing::error!("AI_API_KEY missing; AI endpoints will answer 503"),
    }
    tracing::info!(storage = state.store.backend_name(), "Storage ready");

    auth::rate_limit::spawn_cleanup_worker(state.rate_limiter.clone());

    let addr = state.config.listen_addr();
    let app = routes::router(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    // Connect info feeds the per-IP auth rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
