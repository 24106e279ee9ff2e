// src/main.rs

use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

mod cache;
mod config;
mod db;
mod error;
mod metrics;
mod models;
mod refresh;
mod render;
mod routes;

use cache::ResultCache;
use config::Config;
use refresh::{RefreshLoop, RefreshState};

#[derive(Clone)]
pub struct AppState {
    pub refresh: watch::Receiver<RefreshState>,
    pub refresh_interval: Duration,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from sql_env / .env if present
    dotenvy::from_filename("sql_env").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pizza_dashboard=info,tower_http=info")),
        )
        .init();

    let cfg = Config::from_env()?;
    tracing::debug!(?cfg, "configuration loaded");

    let db = db::connect(&cfg.db)?;
    let cache = ResultCache::new(cfg.cache_ttl, cfg.rating_cache_ttl);
    let (refresh, rx) = RefreshLoop::new(db, cache, cfg.refresh_interval);

    let cancel = CancellationToken::new();
    let refresh_task = tokio::spawn(refresh.run(cancel.clone()));

    let state = AppState { refresh: rx, refresh_interval: cfg.refresh_interval };

    // Read-only API; any origin may poll it
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(routes::dashboard::page))
        .route("/health", get(routes::health::health))
        .route("/api/v1/dashboard", get(routes::dashboard::get_dashboard))
        .route("/api/v1/aggregates", get(routes::dashboard::get_aggregates))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", cfg.http_port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("dashboard listening on http://127.0.0.1:{}", cfg.http_port);

    let shutdown = cancel.clone();
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("shutdown requested"),
                _ = shutdown.cancelled() => {}
            }
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    refresh_task.await?;
    Ok(())
}
