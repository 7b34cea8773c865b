//! Status report construction.
//!
//! Combines probe results into the JSON envelope returned to callers. Metrics
//! are computed only over the probed set, so a peer that was discovered but
//! skipped never influences counts, averages or the overall state.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::probe::{format_millis, ProbeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Running,
    Degraded,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Normal,
    Limited,
}

/// Metric values are either plain counts or preformatted strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(usize),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: &'static str,
    pub value: MetricValue,
}

pub const METRIC_TOTAL: &str = "Total Functions Checked";
pub const METRIC_HEALTHY: &str = "Healthy Functions";
pub const METRIC_AVG_RESPONSE: &str = "Average Response Time";
pub const METRIC_HEALTH_PCT: &str = "Health Percentage";

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state: State,
    pub availability: Availability,
    #[serde(serialize_with = "iso8601")]
    pub last_checked: DateTime<Utc>,
    pub host_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<ProbeResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<Metric>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn iso8601<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Summary numbers over the probed set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub checked: usize,
    pub healthy: usize,
    /// Mean elapsed milliseconds; 0 when nothing was checked
    pub average_response_ms: f64,
    /// Share of running peers, 0..=100; 0 when nothing was checked
    pub health_percentage: f64,
}

impl Summary {
    pub fn from_results(results: &[ProbeResult]) -> Self {
        let checked = results.len();
        let healthy = results.iter().filter(|r| r.is_running()).count();
        let total_ms: f64 = results.iter().map(|r| r.elapsed).sum();

        let (average_response_ms, health_percentage) = if checked > 0 {
            (
                total_ms / checked as f64,
                healthy as f64 / checked as f64 * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            checked,
            healthy,
            average_response_ms,
            health_percentage,
        }
    }

    /// All probed peers are running (vacuously true for an empty set).
    pub fn all_healthy(&self) -> bool {
        self.healthy == self.checked
    }

    pub fn metrics(&self) -> Vec<Metric> {
        vec![
            Metric {
                name: METRIC_TOTAL,
                value: MetricValue::Count(self.checked),
            },
            Metric {
                name: METRIC_HEALTHY,
                value: MetricValue::Count(self.healthy),
            },
            Metric {
                name: METRIC_AVG_RESPONSE,
                value: MetricValue::Text(format_millis(self.average_response_ms)),
            },
            Metric {
                name: METRIC_HEALTH_PCT,
                value: MetricValue::Text(format!("{:.1}%", self.health_percentage)),
            },
        ]
    }
}

impl StatusReport {
    /// Report for a completed check over `results`.
    pub fn from_probes(results: Vec<ProbeResult>, host_names: Vec<String>) -> Self {
        let summary = Summary::from_results(&results);
        let (state, availability) = if summary.all_healthy() {
            (State::Running, Availability::Normal)
        } else {
            (State::Degraded, Availability::Limited)
        };

        Self {
            state,
            availability,
            last_checked: Utc::now(),
            host_names,
            functions: Some(results),
            metrics: Some(summary.metrics()),
            error: None,
        }
    }

    /// Report for a check that could not be completed.
    pub fn failure(error: impl ToString, host_names: Vec<String>) -> Self {
        Self {
            state: State::Error,
            availability: Availability::Limited,
            last_checked: Utc::now(),
            host_names,
            functions: None,
            metrics: None,
            error: Some(error.to_string()),
        }
    }
}
