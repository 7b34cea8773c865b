//! Aggregated status endpoint.
//!
//! `GET` runs discovery, probes every peer and returns the report. `OPTIONS`
//! answers immediately with an empty body. Both always return 200: callers
//! detect degradation from the body's `state`, never from the status code.

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::StatusError;
use crate::report::StatusReport;
use crate::state::AppState;

/// `GET /api/getsystemstatus`
pub async fn status(State(state): State<AppState>) -> Response {
    let report = state.aggregator.report().await;

    match serde_json::to_vec(&report) {
        Ok(body) => (StatusCode::OK, [(CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            let err = StatusError::from(e);
            tracing::error!(error = %err, "Error getting system status");
            let fallback = StatusReport::failure(err, state.aggregator.host_names().to_vec());
            (StatusCode::OK, Json(fallback)).into_response()
        }
    }
}

/// `OPTIONS /api/getsystemstatus`
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
