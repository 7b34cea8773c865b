//! Seeker status: aggregated health of the Seeker function app.
//!
//! Discovers sibling functions, probes each one in turn and serves a
//! consolidated JSON status report with per-function results and summary
//! metrics.

pub mod aggregator;
pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod middleware;
pub mod probe;
pub mod report;
pub mod routes;
pub mod state;

pub use aggregator::HealthAggregator;
pub use error::StatusError;
pub use report::StatusReport;
