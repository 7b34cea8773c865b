//! Liveness endpoint for the aggregator process itself.
//!
//! Unlike the status endpoint this never touches peers; it only shows that the
//! process can answer HTTP.

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
