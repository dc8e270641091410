//! Connection lifecycle management.

use crate::cancel::{with_cancel, CancelToken};
use crate::errors::SinkError;
use crate::metrics::SinkMetrics;
use flut_common::Canvas;
use flut_protocol::{handshake, socket};
use std::fmt;
use std::net::SocketAddr;
use tokio::net::TcpStream;

/// Connection lifecycle states.
///
/// A session moves `Closed -> Connecting -> Open` and back to `Closed` on
/// close or error; there are no other transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No transport.
    Closed,
    /// Resolve/connect/handshake in progress.
    Connecting,
    /// Handshake done; the canvas is known and commands may be sent.
    Open,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
        }
    }
}

/// One open session: the transport plus the canvas learned in its handshake.
#[derive(Debug)]
struct Connection {
    stream: TcpStream,
    canvas: Canvas,
    peer: SocketAddr,
}

/// Owns the TCP session to the Pixelflut server.
///
/// Exactly one connection is live at a time; opening a new one tears the
/// previous one down first. The canvas belongs to the connection that
/// negotiated it and is dropped with it.
#[derive(Debug)]
pub struct ConnectionManager {
    state: ConnectionState,
    connection: Option<Connection>,
    cancel: CancelToken,
    metrics: SinkMetrics,
}

impl ConnectionManager {
    /// Create a manager in the `Closed` state.
    pub fn new(cancel: CancelToken, metrics: SinkMetrics) -> Self {
        Self {
            state: ConnectionState::Closed,
            connection: None,
            cancel,
            metrics,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a handshaken session is available.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// The canvas negotiated by the live session, if any.
    pub fn canvas(&self) -> Option<Canvas> {
        self.connection.as_ref().map(|c| c.canvas)
    }

    /// Open a fresh session: resolve, connect, handshake.
    ///
    /// Any existing session is closed first. On success the transmission
    /// counters are reset for the new connection. Cancellation at any point
    /// yields [`SinkError::Cancelled`] rather than a connect error.
    pub async fn open(&mut self, host: &str, port: u16) -> Result<(), SinkError> {
        self.close();
        self.state = ConnectionState::Connecting;

        match Self::establish(&self.cancel, host, port).await {
            Ok(connection) => {
                tracing::info!(
                    peer = %connection.peer,
                    canvas_width = connection.canvas.width,
                    canvas_height = connection.canvas.height,
                    "session open"
                );
                self.connection = Some(connection);
                self.state = ConnectionState::Open;
                self.metrics.reset();
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Closed;
                Err(e)
            }
        }
    }

    async fn establish(
        cancel: &CancelToken,
        host: &str,
        port: u16,
    ) -> Result<Connection, SinkError> {
        let addr = with_cancel(cancel, socket::resolve(host, port), |source| {
            SinkError::Resolve {
                host: host.to_string(),
                source,
            }
        })
        .await?;

        let mut stream = with_cancel(cancel, socket::connect(addr), |source| {
            SinkError::Connect { addr, source }
        })
        .await?;

        let canvas = with_cancel(
            cancel,
            handshake::request_canvas_size(&mut stream),
            SinkError::Handshake,
        )
        .await?;

        Ok(Connection {
            stream,
            canvas,
            peer: addr,
        })
    }

    /// Tear down the transport.
    ///
    /// Idempotent and infallible. Runs whatever state is reported, so a
    /// stop can never leak a socket.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            // Dropping the stream closes the socket.
            tracing::info!(peer = %connection.peer, "session closed");
        }
        self.state = ConnectionState::Closed;
    }

    /// Borrow the active byte sink and its canvas for the duration of one
    /// send. The borrow must not outlive a reconnect.
    pub(crate) fn session_mut(&mut self) -> Option<(&mut TcpStream, Canvas)> {
        self.connection.as_mut().map(|c| (&mut c.stream, c.canvas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn size_server(reply: &'static [u8]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut query = [0u8; 5];
            stream.read_exact(&mut query).await.unwrap();
            assert_eq!(&query, b"SIZE\n");
            stream.write_all(reply).await.unwrap();
            // Hold the connection until the client is done with it.
            let mut rest = Vec::new();
            let _ = stream.read_to_end(&mut rest).await;
        });
        addr
    }

    fn manager() -> ConnectionManager {
        ConnectionManager::new(CancelToken::new(), SinkMetrics::new())
    }

    #[tokio::test]
    async fn test_open_performs_handshake() {
        let addr = size_server(b"SIZE 800 600\n").await;
        let mut manager = manager();
        assert_eq!(manager.state(), ConnectionState::Closed);

        manager
            .open(&addr.ip().to_string(), addr.port())
            .await
            .unwrap();
        assert_eq!(manager.state(), ConnectionState::Open);
        assert_eq!(manager.canvas(), Some(Canvas::new(800, 600)));
    }

    #[tokio::test]
    async fn test_open_rejects_bad_handshake() {
        let addr = size_server(b"NOPE\n").await;
        let mut manager = manager();

        let err = manager
            .open(&addr.ip().to_string(), addr.port())
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Handshake(_)));
        assert_eq!(manager.state(), ConnectionState::Closed);
        assert!(manager.canvas().is_none());
    }

    #[tokio::test]
    async fn test_open_reports_connect_failure() {
        let mut manager = manager();
        let err = manager.open("127.0.0.1", 1).await.unwrap_err();
        assert!(matches!(err, SinkError::Connect { .. }));
        assert_eq!(manager.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_open_reports_resolve_failure() {
        let mut manager = manager();
        let err = manager
            .open("definitely-not-a-real-host.invalid", 1337)
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Resolve { .. }));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let addr = size_server(b"SIZE 10 10\n").await;
        let mut manager = manager();
        manager
            .open(&addr.ip().to_string(), addr.port())
            .await
            .unwrap();

        manager.close();
        assert_eq!(manager.state(), ConnectionState::Closed);
        assert!(manager.canvas().is_none());

        // Closing again, and closing while already closed, is fine.
        manager.close();
        assert_eq!(manager.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_cancel_during_handshake_reports_cancelled() {
        // A server that accepts but never answers the size query.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut query = [0u8; 5];
            let _ = stream.read_exact(&mut query).await;
            // Read forever, reply never.
            let mut sink = Vec::new();
            let _ = stream.read_to_end(&mut sink).await;
        });

        let cancel = CancelToken::new();
        let mut manager = ConnectionManager::new(cancel.clone(), SinkMetrics::new());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let err = manager
            .open(&addr.ip().to_string(), addr.port())
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(manager.state(), ConnectionState::Closed);
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_metrics_reset_on_open() {
        let metrics = SinkMetrics::new();
        metrics.record_frame(99);

        let addr = size_server(b"SIZE 10 10\n").await;
        let mut manager = ConnectionManager::new(CancelToken::new(), metrics.clone());
        manager
            .open(&addr.ip().to_string(), addr.port())
            .await
            .unwrap();

        assert_eq!(metrics.snapshot().frames_sent, 0);
        assert_eq!(metrics.snapshot().bytes_written, 0);
    }
}
