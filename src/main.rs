//! Seeker status: application entry point.
//!
//! Initializes tracing, loads configuration from a TOML file, builds the
//! health aggregator and its HTTP prober, sets up the Axum router and starts
//! the HTTP server.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seeker_status::aggregator::HealthAggregator;
use seeker_status::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use seeker_status::http::start_server;
use seeker_status::routes::create_router;
use seeker_status::state::AppState;

/// Seeker status: aggregated health for the Seeker function app
#[derive(Parser, Debug)]
#[command(name = "seeker-status", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "seeker_status=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Configuration comes first: it decides the log format
    let config = AppConfig::load(&args.config)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(path = %args.config, "Loaded configuration");

    tracing::info!(
        base_url = %config.status.base_url,
        timeout_ms = config.status.probe_timeout_ms,
        "Probe target configured"
    );

    let aggregator = HealthAggregator::from_config(&config)?;
    let state = AppState::new(aggregator);
    let app = create_router(state);

    start_server(app, &config.http).await?;

    Ok(())
}
