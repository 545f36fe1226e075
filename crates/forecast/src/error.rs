use thiserror::Error;

/// Why a forecast could not be retrieved.
///
/// Never surfaced as a failure to the tool caller; it ends up as text in
/// the tool result.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// Connection, timeout, or body transfer failure.
    #[error("network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not a forecast payload.
    #[error("invalid forecast payload: {0}")]
    Decode(String),
}

/// A coordinate outside the accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),

    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
}
