//! Error types

use thiserror::Error;

/// Result type for fallible feed plumbing
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors raised outside the smoother (I/O, network, configuration)
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Why an inbound message never reached the display buffer
///
/// These are absorbed by the smoother and never surfaced to the viewer.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DropReason {
    #[error("malformed payload")]
    MalformedPayload,

    #[error("empty domain list")]
    EmptyDomainList,

    #[error("heartbeat ignored")]
    HeartbeatIgnored,
}
