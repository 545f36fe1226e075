//! One best-effort request to the forecast API per call.

use reqwest::header::USER_AGENT;
use tracing::{debug, warn};

use crate::config::ForecastConfig;
use crate::error::FetchError;
use crate::model::{Coordinate, ForecastResponse};

const API_KEY_HEADER: &str = "X-QW-Api-Key";

/// What a fetch produced. Failures are values here, never `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    /// At least one forecast day.
    Ready(ForecastResponse),
    /// A well-formed response with no forecast days.
    Empty(ForecastResponse),
    /// Non-success status, transport failure, or undecodable body.
    Unavailable(FetchError),
}

impl ForecastOutcome {
    pub fn from_response(response: ForecastResponse) -> Self {
        if response.daily.is_empty() {
            Self::Empty(response)
        } else {
            Self::Ready(response)
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Fetches forecasts from QWeather.
///
/// No caching and no retries; every call is an independent request.
#[derive(Debug, Clone)]
pub struct ForecastFetcher {
    client: reqwest::Client,
    config: ForecastConfig,
}

impl ForecastFetcher {
    pub fn new(config: ForecastConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn request_url(&self, coordinate: &Coordinate) -> String {
        format!(
            "{}?location={}",
            self.config.endpoint,
            coordinate.location_query()
        )
    }

    /// Fetch the forecast for `coordinate`. Never fails; see [`ForecastOutcome`].
    pub async fn fetch(&self, coordinate: &Coordinate) -> ForecastOutcome {
        match self.request(coordinate).await {
            Ok(response) => ForecastOutcome::from_response(response),
            Err(error) => {
                warn!(
                    location = %coordinate.location_query(),
                    %error,
                    "forecast request failed"
                );
                ForecastOutcome::Unavailable(error)
            }
        }
    }

    async fn request(&self, coordinate: &Coordinate) -> Result<ForecastResponse, FetchError> {
        let url = self.request_url(coordinate);
        debug!(%url, "requesting forecast");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key_header())
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let parsed: ForecastResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        // QWeather reports some failures in-body with HTTP 200.
        if !parsed.code.is_empty() && parsed.code != "200" {
            warn!(code = %parsed.code, "upstream reported a non-200 code");
        }

        debug!(days = parsed.daily.len(), update_time = %parsed.update_time, "forecast received");
        Ok(parsed)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}
