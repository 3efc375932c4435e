//! HTTP surface — Axum server exposing the market operations.
//!
//! Scheduler triggers, oracle samples, participant operations, admin
//! controls, and the side-effect-free read interface. CORS enabled for
//! local development.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        // Scheduler triggers
        .route("/api/rounds/open", post(routes::open_round))
        .route("/api/rounds/lock", post(routes::lock_round))
        // Oracle samples
        .route("/api/oracle/price", post(routes::post_price))
        // Participant operations
        .route("/api/orders", post(routes::place_order))
        .route("/api/orders/refund", post(routes::refund_order))
        .route("/api/orders/claim", post(routes::claim_order))
        // Admin controls
        .route("/api/admin/fees", post(routes::set_fees))
        .route("/api/admin/withdraw", post(routes::withdraw_residual))
        // Read interface
        .route("/api/rounds/current", get(routes::get_current_round))
        .route("/api/rounds/:number", get(routes::get_round))
        .route("/api/rounds/:number/orders/:participant", get(routes::get_order))
        .route("/api/fees", get(routes::get_fees))
        .route("/api/status", get(routes::get_status))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the shutdown future resolves.
pub async fn serve(
    state: AppState,
    port: u16,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    info!(port, "API server listening on http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
