//! Configuration loading and management

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;
use turnstile_auth::AuthMode;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Where session records are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStoreKind {
    /// Process-local map, lost on restart
    #[default]
    Memory,
    /// The `sessions` table of the SQLite database
    Database,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default)]
    pub session_store: SessionStoreKind,
    /// Session lifetime in seconds; 0 means sessions never expire
    #[serde(default)]
    pub session_ttl_secs: u64,
    #[serde(default)]
    pub reveal_login_failures: bool,
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            session_cookie: default_session_cookie(),
            session_store: SessionStoreKind::default(),
            session_ttl_secs: 0,
            reveal_login_failures: false,
            excluded_paths: default_excluded_paths(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_db_path() -> String {
    "./data/turnstile.db".to_string()
}

fn default_session_cookie() -> String {
    "_my_session_id".to_string()
}

fn default_excluded_paths() -> Vec<String> {
    [
        "/api/v1/status/",
        "/api/v1/unauthorized/",
        "/api/v1/forbidden/",
        "/api/v1/auth_session/login/",
        "/api/v1/auth_session/logout/",
        "/users/",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from a file, falling back to defaults when it is missing
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        // Check if config file exists
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Settings that weaken authentication, worth a warning at startup
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.auth.mode == AuthMode::None {
            warnings.push("Authentication is disabled; every route is public");
        }
        if self.auth.reveal_login_failures {
            warnings.push("reveal_login_failures is on; login responses disclose which emails exist");
        }
        warnings
    }

    /// Session lifetime, or `None` when sessions never expire
    pub fn session_ttl(&self) -> Result<Option<chrono::Duration>> {
        let secs = self.auth.session_ttl_secs;
        if secs == 0 {
            return Ok(None);
        }

        i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .map(Some)
            .ok_or_else(|| anyhow!("auth.session_ttl_secs is too large: {}", secs))
    }

    /// Apply command line and environment overrides
    pub fn apply_overrides(
        &mut self,
        bind: Option<String>,
        port: Option<u16>,
        auth_mode: Option<AuthMode>,
        session_cookie: Option<String>,
    ) {
        if let Some(bind) = bind {
            self.server.bind_address = bind;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(mode) = auth_mode {
            self.auth.mode = mode;
        }
        if let Some(name) = session_cookie.filter(|n| !n.is_empty()) {
            self.auth.session_cookie = name;
        }
    }
}
