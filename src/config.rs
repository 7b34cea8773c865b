//! Configuration loading and constants.
//!
//! Loads application configuration from TOML files and defines constants for
//! the probe target, CORS policy, discovery exclusions, logging format, and
//! default paths. `AppConfig` is the root configuration struct containing all settings.

use const_format::formatcp;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Probe Target
// =============================================================================

/// Public host name of the function app being monitored
pub const DEFAULT_HOST_NAME: &str = "seeker-functions.azurewebsites.net";

/// Base URL that peer function names are appended to
pub const DEFAULT_BASE_URL: &str = formatcp!("https://{}/api", DEFAULT_HOST_NAME);

/// Header the function app reads to identify the calling principal
pub const CLIENT_PRINCIPAL_HEADER: &str = "x-ms-client-principal-id";

/// Principal id sent with every probe
pub const DEFAULT_CLIENT_PRINCIPAL: &str = "healthcheck";

/// Per-probe timeout in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;

// =============================================================================
// HTTP Response Headers
// =============================================================================

/// Origins allowed to read the status report cross-origin (exact match)
pub const ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "https://seeker.cityoftraitors.com"];

/// Value of Access-Control-Allow-Methods on every status response
pub const CORS_ALLOW_METHODS: &str = "GET, OPTIONS";

/// Value of Access-Control-Allow-Headers on every status response
pub const CORS_ALLOW_HEADERS: &str = "Content-Type";

/// Status reports are point-in-time and must not be cached upstream
pub const CACHE_CONTROL_STATUS: &str = "no-store";

// =============================================================================
// Discovery Defaults
// =============================================================================

/// Name of this aggregator within the deployment; never probes itself
pub const DEFAULT_SELF_NAME: &str = "getSystemStatus";

/// Discovered but never probed (OAuth callback cannot answer a bare GET)
pub const DEFAULT_SKIP_PROBE: &[&str] = &["callback"];

/// Directory names that are never services
pub const DEFAULT_RESERVED_NAMES: &[&str] = &["tests"];

/// Directory name prefixes that are never services (caches, hidden dirs)
pub const DEFAULT_RESERVED_PREFIXES: &[&str] = &["__", "."];

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "seeker_status=debug,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Probe target and report settings
    #[serde(default)]
    pub status: StatusConfig,
    /// Where peer names come from and which ones to leave out
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        7071
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    /// Base URL; each probe requests `{base_url}/{name}`
    #[serde(default = "StatusConfig::default_base_url")]
    pub base_url: String,
    /// Host names echoed in every report
    #[serde(default = "StatusConfig::default_host_names")]
    pub host_names: Vec<String>,
    /// Per-probe timeout in milliseconds
    #[serde(default = "StatusConfig::default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Value sent in the client principal header
    #[serde(default = "StatusConfig::default_client_principal")]
    pub client_principal: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            host_names: Self::default_host_names(),
            probe_timeout_ms: Self::default_probe_timeout_ms(),
            client_principal: Self::default_client_principal(),
        }
    }
}

impl StatusConfig {
    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }

    fn default_host_names() -> Vec<String> {
        vec![DEFAULT_HOST_NAME.to_string()]
    }

    fn default_probe_timeout_ms() -> u64 {
        DEFAULT_PROBE_TIMEOUT_MS
    }

    fn default_client_principal() -> String {
        DEFAULT_CLIENT_PRINCIPAL.to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Deployment root whose subdirectories are the peer functions
    #[serde(default = "DiscoveryConfig::default_functions_dir")]
    pub functions_dir: PathBuf,
    /// Explicit peer list; replaces the directory scan when non-empty
    #[serde(default)]
    pub peers: Vec<String>,
    #[serde(default = "DiscoveryConfig::default_self_name")]
    pub self_name: String,
    #[serde(default = "DiscoveryConfig::default_skip_probe")]
    pub skip_probe: Vec<String>,
    #[serde(default = "DiscoveryConfig::default_reserved_names")]
    pub reserved_names: Vec<String>,
    #[serde(default = "DiscoveryConfig::default_reserved_prefixes")]
    pub reserved_prefixes: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            functions_dir: Self::default_functions_dir(),
            peers: Vec::new(),
            self_name: Self::default_self_name(),
            skip_probe: Self::default_skip_probe(),
            reserved_names: Self::default_reserved_names(),
            reserved_prefixes: Self::default_reserved_prefixes(),
        }
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl DiscoveryConfig {
    fn default_functions_dir() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_self_name() -> String {
        DEFAULT_SELF_NAME.to_string()
    }

    fn default_skip_probe() -> Vec<String> {
        owned(DEFAULT_SKIP_PROBE)
    }

    fn default_reserved_names() -> Vec<String> {
        owned(DEFAULT_RESERVED_NAMES)
    }

    fn default_reserved_prefixes() -> Vec<String> {
        owned(DEFAULT_RESERVED_PREFIXES)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Loads a config file. A relative `discovery.functions_dir` is resolved
    /// against the file's own directory, never the working directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;

        if config.discovery.functions_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.discovery.functions_dir = base.join(&config.discovery.functions_dir);
        }

        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.status.probe_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "status.probe_timeout_ms must be greater than zero".to_string(),
            ));
        }

        let base = &self.status.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "status.base_url must be an absolute http(s) URL, got '{}'",
                base
            )));
        }

        if !matches!(self.logging.format.to_ascii_lowercase().as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "logging.format must be \"text\" or \"json\", got '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.status.base_url, "https://seeker-functions.azurewebsites.net/api");
        assert_eq!(config.status.host_names, vec!["seeker-functions.azurewebsites.net"]);
        assert_eq!(config.status.probe_timeout_ms, 5000);
        assert_eq!(config.status.client_principal, "healthcheck");
        assert_eq!(config.discovery.self_name, "getSystemStatus");
        assert_eq!(config.discovery.skip_probe, vec!["callback"]);
        assert_eq!(config.discovery.reserved_names, vec!["tests"]);
        assert!(config.discovery.peers.is_empty());
        assert!(!config.logging.is_json());
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::parse(
            r#"
            [http]
            port = 8080

            [status]
            base_url = "http://127.0.0.1:9000/api"
            probe_timeout_ms = 250

            [discovery]
            peers = ["login", "logout"]

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.status.base_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.status.probe_timeout_ms, 250);
        assert_eq!(config.discovery.peers, vec!["login", "logout"]);
        assert!(config.logging.is_json());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = AppConfig::parse("[status]\nprobe_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let err = AppConfig::parse("[status]\nbase_url = \"/api\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = AppConfig::parse("[logging]\nformat = \"xml\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn relative_functions_dir_resolves_against_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.toml");
        std::fs::write(&path, "[discovery]\nfunctions_dir = \"deploy\"").unwrap();

        let config = AppConfig::load(&path).unwrap();

        assert_eq!(config.discovery.functions_dir, dir.path().join("deploy"));
    }

    #[test]
    fn absolute_functions_dir_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let deploy = dir.path().join("wwwroot");
        let path = dir.path().join("status.toml");
        std::fs::write(
            &path,
            format!("[discovery]\nfunctions_dir = \"{}\"", deploy.display()),
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();

        assert_eq!(config.discovery.functions_dir, deploy);
    }

    #[test]
    fn missing_config_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::parse("[status\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
