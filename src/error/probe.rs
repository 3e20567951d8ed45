use thiserror::Error;

/// Why a single probe did not produce a latency sample.
///
/// The `Display` text is what ends up in a route's error list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("HTTP {0}")]
    HttpStatus(u16),
    #[error("Timeout")]
    Timeout,
    #[error("Connection Error: {0}")]
    Connection(String),
    #[error("No response data")]
    NoResponseData,
    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// Maps a transport error from the HTTP client onto the probe taxonomy.
    #[must_use]
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || err.is_request() || err.is_body() {
            Self::Connection(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}
