//! Error types for outputs.

use thiserror::Error;

/// Errors that can occur when handing a record to an output.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Socket or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialized.
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    /// The collector did not accept the connection or data in time.
    #[error("Timed out sending to {0}")]
    Timeout(String),

    /// The receiving side of a channel output was dropped.
    #[error("Channel output is closed")]
    ChannelClosed,

    /// The channel output has no free capacity.
    #[error("Channel output is full")]
    ChannelFull,
}
