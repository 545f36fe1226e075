//! Settings for the upstream forecast API.

use std::fmt;
use std::time::Duration;

/// QWeather 7-day forecast endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://devapi.qweather.com/v7/weather/7d";

/// Client identifier sent as `User-Agent`.
pub const DEFAULT_USER_AGENT: &str = "weather-app/1.0";

/// Applied to the whole request, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the fetcher needs, passed in at construction.
#[derive(Clone)]
pub struct ForecastConfig {
    /// QWeather API key. `None` sends an empty `X-QW-Api-Key` header.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ForecastConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Value for the `X-QW-Api-Key` header.
    pub fn api_key_header(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }
}

impl fmt::Debug for ForecastConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_sends_empty_header() {
        let config = ForecastConfig::default();
        assert_eq!(config.api_key_header(), "");
        assert_eq!(config.with_api_key("abc").api_key_header(), "abc");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ForecastConfig::default().with_api_key("secret-key");
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains("<redacted>"));
    }
}
