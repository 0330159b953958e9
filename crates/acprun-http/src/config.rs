//! # Environment-Based Configuration
//!
//! ## Environment Variables
//!
//! - `ACPRUN_HOST` - Bind host (default: 0.0.0.0)
//! - `ACPRUN_PORT` - Bind port (default: 8000)
//! - `ACPRUN_API_PREFIX` - Path prefix for every route, e.g. `/api/v1` (default: none)
//! - `ACPRUN_WAIT_TIMEOUT_SECS` - Upper bound of `/runs/{id}/wait` (default: 30, max 300)
//! - `ACPRUN_RUN_TTL_SECS` - How long finished runs are kept (default: 3600)
//! - `ACPRUN_CLEANUP_INTERVAL_SECS` - Expired run sweep period (default: 300)
//! - `ACPRUN_ENABLE_CORS` - Enable permissive CORS (default: true)
//! - `ACPRUN_REMOTE_AGENTS` - Comma separated `id=url` pairs forwarded to
//!   other ACP servers

use acprun_core::RunStoreConfig;
use std::str::FromStr;
use std::{env, time::Duration};

/// Longest wait bound a server accepts
pub const MAX_WAIT_TIMEOUT_SECS: u64 = 300;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// An agent id served by another ACP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAgentSpec {
    pub id: String,
    pub url: String,
}

impl FromStr for RemoteAgentSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, url) = s.split_once('=').ok_or_else(|| {
            ConfigError::ValidationError(format!("remote agent '{s}' must be of the form id=url"))
        })?;
        let (id, url) = (id.trim(), url.trim());
        if id.is_empty() || url.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "remote agent '{s}' has an empty id or url"
            )));
        }
        Ok(Self {
            id: id.to_string(),
            url: url.to_string(),
        })
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path prefix, empty or starting with `/` without a trailing slash
    pub api_prefix: String,
    /// Upper bound for a single wait request
    pub wait_timeout: Duration,
    pub store: RunStoreConfig,
    pub enable_cors: bool,
    pub remote_agents: Vec<RemoteAgentSpec>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_prefix: String::new(),
            wait_timeout: Duration::from_secs(30),
            store: RunStoreConfig::default(),
            enable_cors: true,
            remote_agents: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for `ServerConfig` with environment variable support
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any environment variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::default();

        if let Some(host) = get_env_string("ACPRUN_HOST") {
            builder = builder.host(host);
        }
        if let Some(port) = get_env_u16("ACPRUN_PORT")? {
            builder = builder.port(port);
        }
        if let Some(prefix) = get_env_string("ACPRUN_API_PREFIX") {
            builder = builder.api_prefix(prefix);
        }
        if let Some(secs) = get_env_u64("ACPRUN_WAIT_TIMEOUT_SECS")? {
            builder = builder.wait_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = get_env_u64("ACPRUN_RUN_TTL_SECS")? {
            builder = builder.run_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = get_env_u64("ACPRUN_CLEANUP_INTERVAL_SECS")? {
            builder = builder.cleanup_interval(Duration::from_secs(secs));
        }
        if let Some(cors) = get_env_bool("ACPRUN_ENABLE_CORS")? {
            builder = builder.enable_cors(cors);
        }
        if let Some(list) = get_env_string("ACPRUN_REMOTE_AGENTS") {
            for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                let spec = entry.parse().map_err(|e: ConfigError| ConfigError::InvalidEnvVar {
                    key: "ACPRUN_REMOTE_AGENTS".to_string(),
                    message: e.to_string(),
                })?;
                builder = builder.remote_agent(spec);
            }
        }

        Ok(builder)
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the route prefix; a trailing slash is dropped
    #[must_use]
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.api_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.config.wait_timeout = timeout;
        self
    }

    #[must_use]
    pub fn run_ttl(mut self, ttl: Duration) -> Self {
        self.config.store.run_ttl = ttl;
        self
    }

    #[must_use]
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.config.store.cleanup_interval = interval;
        self
    }

    #[must_use]
    pub fn enable_cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    #[must_use]
    pub fn remote_agent(mut self, spec: RemoteAgentSpec) -> Self {
        self.config.remote_agents.push(spec);
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` when a value is out of range.
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let config = self.config;

        if config.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "host must not be empty".to_string(),
            ));
        }
        let wait_secs = config.wait_timeout.as_secs();
        if config.wait_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "wait_timeout must be greater than 0".to_string(),
            ));
        }
        if wait_secs > MAX_WAIT_TIMEOUT_SECS {
            return Err(ConfigError::ValidationError(format!(
                "wait_timeout must be <= {MAX_WAIT_TIMEOUT_SECS} seconds"
            )));
        }
        if config.store.cleanup_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "cleanup_interval must be greater than 0".to_string(),
            ));
        }
        if !config.api_prefix.is_empty() && !config.api_prefix.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "api_prefix '{}' must start with '/'",
                config.api_prefix
            )));
        }

        Ok(config)
    }
}

fn get_env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(val) => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!(
                    "invalid boolean value '{val}', expected true/false/1/0/yes/no/on/off"
                ),
            }),
        },
        Err(_) => Ok(None),
    }
}

fn get_env_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid u64 value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

fn get_env_u16(key: &str) -> Result<Option<u16>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<u16>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid port value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}
