//! pesa-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, connects the store,
//! runs migrations, wires middleware, and starts the HTTP server. All route
//! handlers live in `routes.rs`; shared state types live in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::Method;
use pesa_daemon::{routes, state};
use pesa_reconcile::EngineConfig;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let pool = pesa_store::connect_from_env().await?;
    pesa_store::migrate(&pool).await?;
    let db = pesa_store::status(&pool).await?;
    info!(ok = db.ok, has_orders_table = db.has_orders_table, "database ready");

    let store = Arc::new(pesa_store::PgOrderStore::new(pool));
    let shared = Arc::new(state::AppState::new(store, engine_config_from_env()));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_gateway());

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8900)));
    info!("pesa-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("PESA_DAEMON_ADDR").ok()?.parse().ok()
}

fn engine_config_from_env() -> EngineConfig {
    let mut cfg = EngineConfig::default();
    if let Some(ms) = std::env::var("PESA_STORE_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    {
        cfg.store_timeout = Duration::from_millis(ms);
    }
    cfg
}

/// CORS: the gateway posts server-to-server, so no origin restriction; only
/// the callback POST and health GET are exposed.
fn cors_gateway() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
