//! Warden Session API
//!
//! HTTP service exposing the session lifecycle: login, refresh with
//! rotation, logout, and session administration.

mod config;
mod directory;
mod error;
mod extractors;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use warden_auth_core::SessionService;
use warden_store::MemoryKvStore;

use crate::config::Config;
use crate::directory::HttpUserDirectory;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Warden Session API");

    let config = Config::from_env()?;

    // The in-process store is the single-node default; shared deployments
    // swap in a KeyValueStore backed by an external store
    let kv = Arc::new(MemoryKvStore::new());
    tracing::info!("Session state backed by in-process key-value store");

    let directory = Arc::new(HttpUserDirectory::new(&config.user_directory_url));
    let service = SessionService::new(config.auth.clone(), kv, directory)?;

    let http_port = config.http_port;
    let state = AppState::new(service, config);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh))
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .route("/api/v1/auth/me", get(handlers::auth::me))
        .route("/api/v1/sessions", get(handlers::sessions::list))
        .route("/api/v1/sessions", delete(handlers::sessions::close_all))
        .route("/api/v1/sessions/{id}", delete(handlers::sessions::close))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
