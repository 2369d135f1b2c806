use std::time::Duration;
use thiserror::Error;

/// Fatal errors for a whole search. Nothing is returned alongside these.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("location not found: {query} ({reason})")]
    LocationNotFound { query: String, reason: String },

    #[error("search cancelled")]
    Cancelled,
}

/// A single category's PlaceIndex call failed. Always downgraded to a warning.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("all {attempts} attempts failed: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// Geocoder failure (forward or reverse).
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from geocoder")]
    UnexpectedStatus { status: u16 },

    #[error("malformed geocoder response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Http(err)
        }
    }
}
