//! HTTP route handlers.
//!
//! The status endpoint is mounted under both spellings the function host
//! accepts and carries the CORS policy and a no-store Cache-Control header.
//! The liveness endpoint is plain.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod health;
pub mod status;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::CACHE_CONTROL_STATUS;
use crate::middleware::{cors_layer, request_id_layer};
use crate::state::AppState;

/// Path of the status endpoint as deployed
pub const STATUS_PATH: &str = "/api/getsystemstatus";

/// Mixed-case alias matching the function's directory name
pub const STATUS_PATH_ALIAS: &str = "/api/getSystemStatus";

/// Creates the Axum router with all routes and response headers.
pub fn create_router(state: AppState) -> Router {
    let status_routes = Router::new()
        .route(STATUS_PATH, get(status::status).options(status::preflight))
        .route(
            STATUS_PATH_ALIAS,
            get(status::status).options(status::preflight),
        )
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_STATUS),
        ))
        .layer(middleware::from_fn(cors_layer));

    let health_routes = Router::new().route("/health", get(health::health));

    Router::new()
        .merge(status_routes)
        .merge(health_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
