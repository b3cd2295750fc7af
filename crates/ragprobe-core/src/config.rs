//! ragprobe Configuration Management
//!
//! Handles configuration from environment variables and TOML files,
//! with defaults suitable for a locally running RAG service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::TopK;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Remote RAG endpoint
    pub endpoint: EndpointConfig,

    /// Initial query draft
    pub query: QueryConfig,

    /// Fixture server
    pub mock: MockServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        // Endpoint
        if let Some(url) = lookup("RAG_ENDPOINT_URL") {
            self.endpoint.url = url;
        }
        if let Some(secs) = lookup("RAG_TIMEOUT_SECS") {
            self.endpoint.timeout_secs = Some(parse_var("RAG_TIMEOUT_SECS", secs)?);
        }

        // Query draft
        if let Some(k) = lookup("RAG_DEFAULT_TOP_K") {
            self.query.default_top_k = parse_var("RAG_DEFAULT_TOP_K", k)?;
        }

        // Fixture server
        if let Some(addr) = lookup("MOCK_ADDR") {
            self.mock.addr = addr;
        }
        if let Some(delay) = lookup("MOCK_DELAY_MS") {
            self.mock.delay_ms = parse_var("MOCK_DELAY_MS", delay)?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json_format = parse_var("LOG_JSON", json)?;
        }

        Ok(())
    }

    /// Check values that cannot be expressed by the types alone
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("endpoint.url".to_string()));
        }
        if self.endpoint.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "endpoint.timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// RAG endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Full URL the query is POSTed to
    pub url: String,

    /// Transport-level request timeout in seconds (none by default)
    pub timeout_secs: Option<u64>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/query".to_string(),
            timeout_secs: None,
        }
    }
}

/// Initial draft values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Top-K the draft starts with; clamped on use
    pub default_top_k: i64,
}

impl QueryConfig {
    pub fn top_k(&self) -> TopK {
        TopK::new(self.default_top_k)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_top_k: i64::from(TopK::DEFAULT),
        }
    }
}

/// Fixture server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockServerConfig {
    /// Address to bind to
    pub addr: String,

    /// Artificial latency added to every query, in milliseconds
    pub delay_ms: u64,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8000".to_string(),
            delay_ms: 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
