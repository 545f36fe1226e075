//! Configuration loading from qweather-mcp.toml.

use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use forecast::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ForecastConfig};
use serde::Deserialize;

/// Read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "qweather-mcp.toml";

/// Environment variable holding the QWeather API key.
pub const API_KEY_ENV: &str = "QWEATHER_API_KEY";

const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub qweather: QWeatherConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Upstream API settings.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QWeatherConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for QWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// How the MCP server is exposed.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub transport: Transport,
    /// Returned to clients in the `initialize` result.
    pub instructions: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            transport: Transport::default(),
            instructions: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// HTTP with Server-Sent Events
    #[default]
    Sse,
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Overlay environment settings. Empty values count as unset.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.qweather.api_key = Some(key);
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.qweather.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn forecast_config(&self) -> Result<ForecastConfig, ConfigError> {
        if self.qweather.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "qweather.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(ForecastConfig {
            api_key: self.qweather.api_key.clone().filter(|k| !k.is_empty()),
            endpoint: self.qweather.endpoint.clone(),
            user_agent: self.qweather.user_agent.clone(),
            timeout: Duration::from_secs(self.qweather.timeout_secs),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
