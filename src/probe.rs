//! Liveness probes against peer functions.
//!
//! A probe is a single GET to `{base_url}/{name}`. Any received response is a
//! result (status < 500 means running); transport failures such as timeouts,
//! refused connections and DNS errors become an `error` result with status
//! code 500 and zero elapsed time. Probes never fail the request as a whole.

use std::error::Error as _;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{StatusConfig, CLIENT_PRINCIPAL_HEADER};

/// Status code recorded when no response was received
pub const UNREACHABLE_STATUS_CODE: u16 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Running,
    Error,
}

/// Outcome of probing one peer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub name: String,
    pub status: ProbeStatus,
    /// Elapsed time rounded to whole milliseconds, e.g. `"153ms"`
    pub response_time: String,
    pub status_code: u16,
    /// Elapsed time in milliseconds
    pub elapsed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    /// Result for a peer that answered with `status_code` after `elapsed`.
    pub fn answered(name: impl Into<String>, status_code: u16, elapsed: Duration) -> Self {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let status = if status_code < 500 {
            ProbeStatus::Running
        } else {
            ProbeStatus::Error
        };

        Self {
            name: name.into(),
            status,
            response_time: format_millis(elapsed_ms),
            status_code,
            elapsed: elapsed_ms,
            error: None,
        }
    }

    /// Result for a peer that could not be reached at all.
    pub fn unreachable(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ProbeStatus::Error,
            response_time: format_millis(0.0),
            status_code: UNREACHABLE_STATUS_CODE,
            elapsed: 0.0,
            error: Some(error.into()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ProbeStatus::Running
    }
}

/// Renders milliseconds with no decimals: `76.6` becomes `"77ms"`.
pub fn format_millis(ms: f64) -> String {
    format!("{:.0}ms", ms)
}

/// Issues a liveness probe for a single peer.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, name: &str) -> ProbeResult;
}

/// Probes peers over HTTP(S) with a shared client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    base_url: String,
    client_principal: String,
}

impl HttpProber {
    pub fn new(config: &StatusConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.probe_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_principal: config.client_principal.clone(),
        })
    }

    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, name: &str) -> ProbeResult {
        let url = self.url_for(name);
        let start = Instant::now();

        // Receipt includes the body; a stalled body trips the client timeout
        let outcome = async {
            let response = self
                .client
                .get(&url)
                .header(CLIENT_PRINCIPAL_HEADER, &self.client_principal)
                .send()
                .await?;
            let status_code = response.status().as_u16();
            response.bytes().await?;
            Ok::<_, reqwest::Error>((status_code, start.elapsed()))
        }
        .await;

        match outcome {
            Ok((status_code, elapsed)) => {
                let result = ProbeResult::answered(name, status_code, elapsed);
                tracing::debug!(
                    function = %name,
                    status_code = result.status_code,
                    elapsed_ms = result.elapsed,
                    "Probe answered"
                );
                result
            }
            Err(e) => {
                let detail = error_chain(&e);
                tracing::warn!(
                    function = %name,
                    %url,
                    timeout = e.is_timeout(),
                    error = %detail,
                    "Probe failed"
                );
                ProbeResult::unreachable(name, detail)
            }
        }
    }
}

/// Flattens an error and its sources into one line; reqwest's top-level
/// message alone omits the cause (timeout, refused, DNS).
fn error_chain(err: &reqwest::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !detail.contains(&text) {
            detail.push_str(": ");
            detail.push_str(&text);
        }
        source = cause.source();
    }
    detail
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::get, Router};
    use std::net::SocketAddr;

    async fn spawn_peer() -> SocketAddr {
        let app = Router::new()
            .route("/api/healthy", get(|| async { "ok" }))
            .route("/api/unauthorized", get(|| async { StatusCode::UNAUTHORIZED }))
            .route("/api/broken", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .route(
                "/api/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            )
            .route(
                "/api/stalled",
                get(|| async {
                    let chunks = futures::stream::unfold(0u8, |sent| async move {
                        match sent {
                            0 => Some((Ok::<_, std::io::Error>("partial"), 1)),
                            _ => {
                                tokio::time::sleep(Duration::from_secs(2)).await;
                                None
                            }
                        }
                    });
                    axum::body::Body::from_stream(chunks)
                }),
            )
            .route(
                "/api/whoami",
                get(|headers: HeaderMap| async move {
                    match headers.get(CLIENT_PRINCIPAL_HEADER) {
                        Some(v) if v == "healthcheck" => StatusCode::NO_CONTENT,
                        _ => StatusCode::FORBIDDEN,
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn prober_for(addr: SocketAddr, timeout_ms: u64) -> HttpProber {
        HttpProber::new(&StatusConfig {
            base_url: format!("http://{}/api/", addr),
            probe_timeout_ms: timeout_ms,
            ..StatusConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn answered_classifies_by_status_code() {
        let ok = ProbeResult::answered("login", 200, Duration::from_millis(150));
        assert_eq!(ok.status, ProbeStatus::Running);
        assert_eq!(ok.response_time, "150ms");
        assert!((ok.elapsed - 150.0).abs() < 1e-6);
        assert_eq!(ok.error, None);

        let client_error = ProbeResult::answered("login", 499, Duration::from_millis(5));
        assert!(client_error.is_running());

        let server_error = ProbeResult::answered("login", 500, Duration::from_millis(50));
        assert_eq!(server_error.status, ProbeStatus::Error);
        assert_eq!(server_error.status_code, 500);
        assert_eq!(server_error.response_time, "50ms");
    }

    #[test]
    fn unreachable_has_fixed_shape() {
        let result = ProbeResult::unreachable("logout", "Connection timed out");
        assert_eq!(result.status, ProbeStatus::Error);
        assert_eq!(result.status_code, 500);
        assert_eq!(result.elapsed, 0.0);
        assert_eq!(result.response_time, "0ms");
        assert_eq!(result.error.as_deref(), Some("Connection timed out"));
    }

    #[test]
    fn error_field_is_omitted_when_absent() {
        let json = serde_json::to_value(ProbeResult::answered("login", 200, Duration::ZERO)).unwrap();
        assert_eq!(json["status"], "running");
        assert!(json.get("error").is_none());

        let json = serde_json::to_value(ProbeResult::unreachable("login", "refused")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "refused");
    }

    #[test]
    fn millis_round_to_nearest() {
        assert_eq!(format_millis(0.0), "0ms");
        assert_eq!(format_millis(76.666), "77ms");
        assert_eq!(format_millis(1499.4), "1499ms");
    }

    #[test]
    fn url_joins_base_and_name() {
        let prober = HttpProber::new(&StatusConfig::default()).unwrap();
        assert_eq!(
            prober.url_for("login"),
            "https://seeker-functions.azurewebsites.net/api/login"
        );
    }

    #[tokio::test]
    async fn healthy_peer_is_running() {
        let addr = spawn_peer().await;
        let result = prober_for(addr, 5000).probe("healthy").await;

        assert_eq!(result.name, "healthy");
        assert_eq!(result.status, ProbeStatus::Running);
        assert_eq!(result.status_code, 200);
        assert!(result.response_time.ends_with("ms"));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn client_errors_still_count_as_running() {
        let addr = spawn_peer().await;
        let result = prober_for(addr, 5000).probe("unauthorized").await;

        assert_eq!(result.status, ProbeStatus::Running);
        assert_eq!(result.status_code, 401);
    }

    #[tokio::test]
    async fn server_error_is_reported_with_its_code() {
        let addr = spawn_peer().await;
        let result = prober_for(addr, 5000).probe("broken").await;

        assert_eq!(result.status, ProbeStatus::Error);
        assert_eq!(result.status_code, 503);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn probe_sends_client_principal() {
        let addr = spawn_peer().await;
        let result = prober_for(addr, 5000).probe("whoami").await;

        assert_eq!(result.status_code, 204);
    }

    #[tokio::test]
    async fn timeout_becomes_unreachable() {
        let addr = spawn_peer().await;
        let result = prober_for(addr, 200).probe("slow").await;

        assert_eq!(result.status, ProbeStatus::Error);
        assert_eq!(result.status_code, 500);
        assert_eq!(result.elapsed, 0.0);
        assert_eq!(result.response_time, "0ms");
        assert!(!result.error.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn stalled_body_becomes_unreachable() {
        let addr = spawn_peer().await;
        let result = prober_for(addr, 300).probe("stalled").await;

        assert_eq!(result.status, ProbeStatus::Error);
        assert_eq!(result.status_code, 500);
        assert_eq!(result.elapsed, 0.0);
        assert_eq!(result.response_time, "0ms");
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn refused_connection_becomes_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = prober_for(addr, 1000).probe("anything").await;

        assert_eq!(result.status, ProbeStatus::Error);
        assert_eq!(result.status_code, 500);
        assert!(result.error.is_some());
    }
}
