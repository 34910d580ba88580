mod capability;
mod clients;
mod config;
mod errors;
mod handlers;
mod handoff;
mod models;
mod normalizer;
mod orchestrator;
mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::clients::BbpsClient;
use crate::config::Config;
use crate::handoff::HandoffStore;

/// Main entry point for the application.
///
/// Initializes logging, configuration, the BBPS upstream client, the biller
/// catalog cache and session hand-off store, then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_bbps_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Biller catalog cache: catalogs change rarely, TTL keeps them fresh enough
    let biller_cache = Cache::builder()
        .time_to_live(Duration::from_secs(config.biller_cache_ttl_secs))
        .max_capacity(1_000)
        .build();
    tracing::info!(
        "Biller catalog cache initialized ({}s TTL)",
        config.biller_cache_ttl_secs
    );

    // Fee config cache: same TTL as the catalog
    let fee_cache = Cache::builder()
        .time_to_live(Duration::from_secs(config.biller_cache_ttl_secs))
        .max_capacity(10_000)
        .build();
    tracing::info!("Fee config cache initialized");

    // Session hand-off store: one in-flight payload per session, 30 minute TTL
    let handoff_store = HandoffStore::new(Duration::from_secs(1800));
    tracing::info!("Session hand-off store initialized");

    // Initialize BBPS upstream client
    let bbps_client = BbpsClient::new(config.bbps_base_url.clone(), config.bbps_token.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialize BBPS client: {}", e))?;
    tracing::info!("BBPS client initialized: {}", config.bbps_base_url);

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        config: config.clone(),
        bbps_client,
        biller_cache,
        fee_cache,
        handoff_store,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        .route("/api/v1/billers", get(handlers::list_billers))
        .route(
            "/api/v1/billers/:biller_id/plans",
            get(handlers::pull_plans),
        )
        .route("/api/v1/bills/submit", post(handlers::submit_bill))
        .route(
            "/api/v1/bills/handoff/:session_id",
            get(handlers::take_handoff),
        )
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload (submissions are small)
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
