//! API routes

mod games;

use axum::{
    Json, Router,
    extract::{MatchedPath, Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::state::{AppState, MetricsHandle};

pub use games::{AddressResponse, DataResponse};

/// Count requests per method, route and client agent
async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();
    let agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    debug!("{} {} (agent: {:?})", method, endpoint, agent);
    ::metrics::counter!(
        "nox_http_requests",
        "method" => method,
        "endpoint" => endpoint,
        "agent" => agent
    )
    .increment(1);

    next.run(request).await
}

/// Health status response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics - Prometheus metrics endpoint
async fn get_metrics(State(handle): State<Arc<MetricsHandle>>) -> String {
    handle.render()
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Lobby API (v0)
        .merge(games::routes())
        .route_layer(middleware::from_fn(track_requests))
        .with_state(state)
}

/// Create the router served on the monitoring address
pub fn monitor_router(handle: Arc<MetricsHandle>) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .with_state(handle)
        .route("/health", get(health))
}
