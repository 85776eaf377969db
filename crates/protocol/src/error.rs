//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding client messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported frame type: {0}")]
    UnsupportedFrame(&'static str),
}
