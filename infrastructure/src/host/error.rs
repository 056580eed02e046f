//! Error types for the host connection

use thiserror::Error;

/// Result type alias for host connection setup
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors raised while reading a framed message.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame of {0} bytes exceeds the {max} byte limit", max = super::codec::MAX_FRAME_LEN)]
    TooLarge(usize),

    #[error("Connection closed mid-frame")]
    Truncated,
}

/// Errors that can occur while establishing the host connection
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Failed to connect to host at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Host closed the connection during authentication")]
    HandshakeClosed,

    #[error("Host did not complete authentication in time")]
    HandshakeTimeout,

    #[error("Host rejected the access token: {0}")]
    AuthRejected(String),

    #[error("Unexpected message during authentication: {0}")]
    UnexpectedHandshake(String),
}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        HostError::Frame(FrameError::Io(e))
    }
}
