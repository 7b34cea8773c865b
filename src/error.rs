//! Infrastructure failures for the status endpoint.
//!
//! Probe-level failures never appear here; they are folded into a
//! `ProbeResult` with status `error`. A `StatusError` means the report itself
//! could not be produced and the caller gets the top-level error report.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("Failed to read functions directory {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize status report: {0}")]
    Serialization(#[from] serde_json::Error),
}
