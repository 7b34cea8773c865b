//! Peer service discovery.
//!
//! Peer names come either from the deployment layout (one subdirectory per
//! function) or from an explicit list in the configuration. Both sources run
//! through the same `DiscoveryPolicy`, which owns every exclusion rule.

use std::path::{Path, PathBuf};

use crate::config::DiscoveryConfig;
use crate::error::StatusError;

/// Exclusion rules applied to discovered names and to the probe set.
#[derive(Debug, Clone)]
pub struct DiscoveryPolicy {
    /// Lower-cased name of the aggregator itself
    self_name: String,
    /// Exact names that are never services
    reserved_names: Vec<String>,
    /// Prefixes that mark non-service directories
    reserved_prefixes: Vec<String>,
    /// Lower-cased names that are discovered but never probed
    skip_probe: Vec<String>,
}

impl DiscoveryPolicy {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            self_name: config.self_name.to_lowercase(),
            reserved_names: config.reserved_names.clone(),
            reserved_prefixes: config.reserved_prefixes.clone(),
            skip_probe: config.skip_probe.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    /// Returns the normalized service name, or `None` if the entry is excluded.
    pub fn admit(&self, raw: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }
        if self.reserved_prefixes.iter().any(|p| raw.starts_with(p.as_str())) {
            return None;
        }
        if self.reserved_names.iter().any(|r| r == raw) {
            return None;
        }

        let name = raw.to_lowercase();
        if name == self.self_name {
            return None;
        }
        Some(name)
    }

    /// Whether a discovered service should actually be probed.
    pub fn should_probe(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        !self.skip_probe.iter().any(|s| *s == name)
    }
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self::new(&DiscoveryConfig::default())
    }
}

/// Where candidate peer names come from.
#[derive(Debug, Clone)]
pub enum DiscoverySource {
    /// Scan subdirectories of the deployment root on every request
    Directory(PathBuf),
    /// Fixed peer list, probed in the configured order
    Static(Vec<String>),
}

impl DiscoverySource {
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        if config.peers.is_empty() {
            DiscoverySource::Directory(config.functions_dir.clone())
        } else {
            DiscoverySource::Static(config.peers.clone())
        }
    }

    /// Enumerate candidate peers, with `policy` exclusions applied.
    ///
    /// Directory scans are sorted so probe order does not depend on the
    /// filesystem. Names that collide after lower-casing are reported once.
    pub async fn discover(&self, policy: &DiscoveryPolicy) -> Result<Vec<String>, StatusError> {
        match self {
            DiscoverySource::Directory(path) => {
                let mut names = scan_directory(path, policy).await?;
                names.sort();
                names.dedup();
                Ok(names)
            }
            DiscoverySource::Static(peers) => {
                let mut names: Vec<String> = Vec::with_capacity(peers.len());
                for name in peers.iter().filter_map(|p| policy.admit(p)) {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                Ok(names)
            }
        }
    }
}

async fn scan_directory(path: &Path, policy: &DiscoveryPolicy) -> Result<Vec<String>, StatusError> {
    let io_err = |source| StatusError::Discovery {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(path).await.map_err(io_err)?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        // Follows symlinks, so a linked function directory still counts
        let is_dir = match tokio::fs::metadata(entry.path()).await {
            Ok(meta) => meta.is_dir(),
            Err(e) => {
                tracing::debug!(entry = ?entry.path(), error = %e, "Skipping unreadable entry");
                false
            }
        };
        if !is_dir {
            continue;
        }

        let raw = entry.file_name();
        if let Some(name) = policy.admit(&raw.to_string_lossy()) {
            names.push(name);
        }
    }

    Ok(names)
}
