// Error types for the kindex crate.
// Separates transport failures from markup parse failures so callers can tell them apart.

use thiserror::Error;

use crate::meteoagent::Day;

/// Outbound request failed before a usable body was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if let Some(status) = err.status() {
            TransportError::Status {
                status: status.as_u16(),
            }
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Page was fetched but the expected values could not be extracted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("marker for {0} not found in page")]
    MissingMarker(Day),

    #[error("no value after label for {day}: {text:?}")]
    MissingValue { day: Day, text: String },

    #[error("value for {day} is not an integer: {token:?}")]
    NotAnInteger { day: Day, token: String },

    #[error("value for {day} out of range 1-9: {value}")]
    OutOfRange { day: Day, value: i64 },

    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
}

/// Any failed refresh attempt. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("fetch aborted unexpectedly: {0}")]
    Internal(String),
}

impl FetchError {
    /// Short label used in log fields and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Parse(_) => "parse",
            FetchError::Internal(_) => "internal",
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, FetchError::Parse(_))
    }
}

/// Setup-time errors surfaced to the host.
#[derive(Error, Debug)]
pub enum KIndexError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("initial refresh failed: {0}")]
    Fetch(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, KIndexError>;
