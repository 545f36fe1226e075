//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An explicitly requested config file does not exist.
    #[error("config file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration is invalid or could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The forecast client could not be built.
    #[error(transparent)]
    Forecast(#[from] forecast::FetchError),

    /// The MCP server failed to start or stopped with an error.
    #[error(transparent)]
    Server(#[from] mcp::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
