//! Error types for the transport boundary and the trading control loop.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TraderError>;

/// Failures raised while exchanging a request with the game server.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("queue failure: {0}")]
    Queue(String),

    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("operation cancelled by shutdown")]
    Cancelled,
}

impl TransportError {
    /// Whether the retry loop may try the same request again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout
                | TransportError::RateLimited { .. }
                | TransportError::Status { .. }
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Top-level error for ship operations.
#[derive(Error, Debug)]
pub enum TraderError {
    #[error("transport error: {0}")]
    Transport(TransportError),

    #[error("could not decode server payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("server rejected request ({code}): {message}")]
    ServerApplication { code: i32, message: String },

    #[error("flight plan to {destination} still rejected after {attempts} attempts")]
    FlightPlanRejected { destination: String, attempts: u32 },

    #[error("refusing to {kind} {quantity} units of {good}")]
    InvalidTrade {
        kind: String,
        good: String,
        quantity: i32,
    },

    #[error("cannot free {required} units of cargo space for fuel at {location}")]
    ResourceExhausted { required: i32, location: String },

    #[error("route error: {0}")]
    Route(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled by shutdown")]
    Cancelled,
}

impl TraderError {
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            TraderError::Cancelled | TraderError::Transport(TransportError::Cancelled)
        )
    }
}

impl From<TransportError> for TraderError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Cancelled => TraderError::Cancelled,
            other => TraderError::Transport(other),
        }
    }
}

impl From<toml::de::Error> for TraderError {
    fn from(err: toml::de::Error) -> Self {
        TraderError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TraderError {
    fn from(err: toml::ser::Error) -> Self {
        TraderError::Config(err.to_string())
    }
}
