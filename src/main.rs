mod config;
mod metrics;
mod models;
mod routes;
mod services;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::{
    catalog::CatalogClient,
    session::SessionCoordinator,
    sweeper::{start_sweeper_task, SweeperConfig},
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionCoordinator>,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelgate=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting Reelgate v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.node_env);
    tracing::info!("Catalog API: {}", config.catalog_api_url);

    // Catalog backend client
    let catalog = CatalogClient::new(
        &config.catalog_api_url,
        config.catalog_api_token.clone(),
        config.fetch_timeout_ms,
        &config.user_agent,
    );

    // Watch session coordinator
    let sessions = Arc::new(SessionCoordinator::new(
        Arc::new(catalog),
        config.source_order(),
    ));
    tracing::info!(
        "Session coordinator initialized (primary source: {})",
        config.primary_source
    );

    // Start the expiry sweeper (runs in background)
    let sweeper_sessions = sessions.clone();
    let sweeper_config = SweeperConfig {
        interval_secs: config.sweep_interval_secs,
        session_ttl_seconds: config.session_ttl_seconds,
    };
    tokio::spawn(start_sweeper_task(sweeper_sessions, sweeper_config));
    tracing::info!("Session sweeper started");

    // Build application state
    let state = Arc::new(AppState {
        config,
        sessions,
        start_time: Instant::now(),
    });

    // Build router
    let app = Router::new()
        // Health endpoints
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/live", get(routes::health::live))
        // Identity resolution
        .route("/api/resolve", get(routes::watch::resolve_path))
        // Watch session endpoints
        .route("/api/watch", post(routes::watch::create_session))
        .route(
            "/api/watch/:id",
            get(routes::watch::poll_session).delete(routes::watch::teardown_session),
        )
        .route("/api/watch/:id/navigate", post(routes::watch::navigate))
        .route(
            "/api/watch/:id/source/report",
            post(routes::watch::report_source),
        )
        .route(
            "/api/watch/:id/source/switch",
            post(routes::watch::switch_source),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
