//! Request middleware: request ID spans and CORS headers.
//!
//! `request_id_layer` generates a UUID v4 for each incoming request and wraps
//! the request in a tracing span so every log line emitted while discovering
//! and probing peers carries the same request_id.
//!
//! `cors_layer` applies the fixed cross-origin policy of the status endpoint.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ALLOWED_ORIGINS, CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS};

/// Extension type for accessing request ID in handlers if needed.
#[derive(Clone, Debug)]
pub struct RequestId(pub Uuid);

/// Middleware that generates a request ID and creates a request span.
///
/// This should be the outermost middleware layer so the span wraps
/// all request processing, including other middleware and handlers.
pub async fn request_id_layer(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();
    request.extensions_mut().insert(RequestId(request_id));

    async move {
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms,
            "Request completed"
        );

        response
    }
    .instrument(span)
    .await
}

/// Returns the origin to echo back, if it is on the allow-list.
pub fn allowed_origin(origin: Option<&HeaderValue>) -> Option<HeaderValue> {
    let origin = origin?;
    let text = origin.to_str().ok()?;
    ALLOWED_ORIGINS
        .iter()
        .any(|allowed| *allowed == text)
        .then(|| origin.clone())
}

/// Adds CORS headers to every response.
///
/// The request's Origin is reflected only on an exact allow-list match;
/// methods and headers are always advertised.
pub async fn cors_layer(request: Request, next: Next) -> Response {
    let origin = allowed_origin(request.headers().get(ORIGIN));

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    if let Some(origin) = origin {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    response
}
