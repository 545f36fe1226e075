//! QWeather forecast lookup exposed as an MCP tool.
//!
//! - [`ForecastFetcher`] makes one request per call and never fails; the
//!   result is a [`ForecastOutcome`].
//! - [`format_forecast`] turns an outcome into display text.
//! - [`ForecastTool`] wires both into an [`mcp::ToolHost`] as `get-forecast`.
//!
//! # Example
//!
//! ```no_run
//! use forecast::{Coordinate, ForecastConfig, ForecastFetcher, format_forecast};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = ForecastFetcher::new(ForecastConfig::default().with_api_key("..."))?;
//! let shanghai = Coordinate::new(121.4737, 31.2304)?;
//! let outcome = fetcher.fetch(&shanghai).await;
//! println!("{}", format_forecast(&outcome, &shanghai, &chrono::Local::now()));
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod fetcher;
mod format;
mod model;
mod tool;

pub use config::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ForecastConfig};
pub use error::{CoordinateError, FetchError};
pub use fetcher::{ForecastFetcher, ForecastOutcome};
pub use format::{EMPTY_FORECAST_MESSAGE, format_forecast};
pub use model::{Coordinate, DayForecast, ForecastResponse, Refer};
pub use tool::{ForecastTool, TOOL_NAME};
