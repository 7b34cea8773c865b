//! Discovery, probing and aggregation for one status request.
//!
//! Each call is self-contained: peers are rediscovered, probed one at a time
//! in discovery order, and summarized into a fresh `StatusReport`. Nothing is
//! cached between calls.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::discovery::{DiscoveryPolicy, DiscoverySource};
use crate::error::StatusError;
use crate::probe::{HttpProber, Prober};
use crate::report::StatusReport;

#[derive(Clone)]
pub struct HealthAggregator {
    source: DiscoverySource,
    policy: DiscoveryPolicy,
    prober: Arc<dyn Prober>,
    host_names: Vec<String>,
}

impl HealthAggregator {
    pub fn new(
        source: DiscoverySource,
        policy: DiscoveryPolicy,
        prober: Arc<dyn Prober>,
        host_names: Vec<String>,
    ) -> Self {
        Self {
            source,
            policy,
            prober,
            host_names,
        }
    }

    /// Builds the production aggregator: configured discovery and an HTTP prober.
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let prober = HttpProber::new(&config.status)?;
        let source = DiscoverySource::from_config(&config.discovery);
        match &source {
            DiscoverySource::Directory(dir) => {
                tracing::info!(functions_dir = %dir.display(), "Discovering peers from deployment layout");
            }
            DiscoverySource::Static(peers) => {
                tracing::info!(peers = ?peers, "Using configured peer list");
            }
        }

        Ok(Self::new(
            source,
            DiscoveryPolicy::new(&config.discovery),
            Arc::new(prober),
            config.status.host_names.clone(),
        ))
    }

    pub fn host_names(&self) -> &[String] {
        &self.host_names
    }

    /// Runs a full check. Probe failures are part of the report; only
    /// infrastructure failures are returned as errors.
    pub async fn check(&self) -> Result<StatusReport, StatusError> {
        let discovered = self.source.discover(&self.policy).await?;

        let (to_probe, skipped): (Vec<String>, Vec<String>) = discovered
            .into_iter()
            .partition(|name| self.policy.should_probe(name));

        tracing::debug!(
            discovered = to_probe.len() + skipped.len(),
            probing = to_probe.len(),
            skipped = ?skipped,
            "Discovered peer functions"
        );

        let mut results = Vec::with_capacity(to_probe.len());
        for name in &to_probe {
            results.push(self.prober.probe(name).await);
        }

        let report = StatusReport::from_probes(results, self.host_names.clone());
        tracing::info!(state = ?report.state, checked = to_probe.len(), "Status check completed");
        Ok(report)
    }

    /// Runs a full check, converting any infrastructure failure into the
    /// error report.
    pub async fn report(&self) -> StatusReport {
        match self.check().await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Error getting system status");
                StatusReport::failure(e, self.host_names.clone())
            }
        }
    }
}
