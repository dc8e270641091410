//! Error types for the Pixelflut protocol layer.

use std::io;
use thiserror::Error;

/// Errors raised while speaking the wire protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The `SIZE` reply ended before a full line arrived.
    #[error("size reply too short: {0} bytes")]
    ShortSizeReply(usize),

    /// The `SIZE` reply did not match `SIZE <width> <height>`.
    #[error("malformed size reply: {0:?}")]
    MalformedSizeReply(String),

    /// A `PX` line could not be parsed back into a command.
    #[error("malformed command line: {0:?}")]
    MalformedCommand(String),

    /// The transport failed mid-exchange.
    #[error(transparent)]
    Io(#[from] io::Error),
}
