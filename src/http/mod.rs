//! HTTP server module.
//!
//! Serves the router on the configured address and drains in-flight requests
//! on SIGTERM/SIGINT. Status checks can take several probe timeouts, so the
//! drain window is generous.

mod server;
mod shutdown;

pub use server::{start_server, ServerError};
