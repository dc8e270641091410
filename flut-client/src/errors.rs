//! Error types for the streaming sink.

use flut_frame::FrameError;
use flut_protocol::ProtocolError;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors surfaced by the connection manager and streaming sink.
///
/// Cancellation is always a distinct variant, never folded into a generic
/// I/O error, so the host can tell "stopped on purpose" from "broke".
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller supplied a frame inconsistent with its declared layout.
    /// Rejects that frame only; the connection is unaffected.
    #[error("invalid frame: {0}")]
    InvalidFrame(#[from] FrameError),

    /// Name resolution failed during the connect phase.
    #[error("name resolution failed for {host:?}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    /// The TCP connect itself failed.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The canvas-size exchange failed; fatal for that connection attempt.
    #[error("canvas size handshake failed: {0}")]
    Handshake(#[from] ProtocolError),

    /// The operation was aborted through the cancellation token.
    #[error("cancelled")]
    Cancelled,

    /// The server closed the connection mid-write.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Any other transport failure while sending.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
}

impl SinkError {
    /// Whether this outcome means "stopped on purpose".
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether one transparent reconnect-and-retry may be attempted.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ConnectionClosed)
    }

    /// Classify a transport error raised while sending commands.
    pub(crate) fn from_write_error(source: io::Error) -> Self {
        use io::ErrorKind::*;
        match source.kind() {
            BrokenPipe | ConnectionReset | ConnectionAborted | UnexpectedEof | WriteZero => {
                Self::ConnectionClosed
            }
            _ => Self::Write(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_close_kinds_are_recoverable() {
        for kind in [
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::UnexpectedEof,
            io::ErrorKind::WriteZero,
        ] {
            let err = SinkError::from_write_error(io::Error::from(kind));
            assert!(err.is_recoverable(), "{kind:?} should be recoverable");
        }
    }

    #[test]
    fn test_other_write_errors_are_fatal() {
        let err = SinkError::from_write_error(io::Error::from(io::ErrorKind::OutOfMemory));
        assert!(matches!(err, SinkError::Write(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_cancelled_is_distinguished() {
        assert!(SinkError::Cancelled.is_cancelled());
        assert!(!SinkError::Cancelled.is_recoverable());
        assert!(!SinkError::ConnectionClosed.is_cancelled());
    }
}
