//! The per-frame streaming cycle.

use crate::cancel::{with_cancel, CancelToken};
use crate::config::{SharedConfig, SinkConfig};
use crate::connection::{ConnectionManager, ConnectionState};
use crate::errors::SinkError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use flut_common::Canvas;
use flut_encoder::{encode, CommandIter, Strategy};
use flut_frame::{FrameStore, FrameView};
use flut_protocol::PacketBatcher;
use tokio::net::TcpStream;

/// What happened to one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Every emitted command reached the server.
    Sent,
    /// The sink is flushing: the frame was dropped because cancellation
    /// fired. Not an error; the host decides whether to resume or stop.
    Flushing,
}

/// Streams frames to a Pixelflut server.
///
/// The sink is driven by the host's delivery thread, one frame at a time:
/// each [`send_frame`](Self::send_frame) call encodes, batches and
/// transmits one frame before returning. The sink spawns no tasks of its
/// own; the [`CancelToken`] is the only way to unblock it early.
pub struct StreamingSink {
    config: SharedConfig,
    metrics: SinkMetrics,
    cancel: CancelToken,
    connection: ConnectionManager,
    previous: FrameStore,
}

impl StreamingSink {
    /// Create a sink around a shared configuration.
    pub fn new(config: SharedConfig) -> Self {
        let cancel = CancelToken::new();
        let metrics = SinkMetrics::new();
        let connection = ConnectionManager::new(cancel.clone(), metrics.clone());
        Self {
            config,
            metrics,
            cancel,
            connection,
            previous: FrameStore::new(),
        }
    }

    /// The shared configuration handle.
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Current transmission counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The canvas negotiated by the live connection, if any.
    pub fn canvas(&self) -> Option<Canvas> {
        self.connection.canvas()
    }

    /// The connection lifecycle state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// A handle to the cancellation token, for the host's control path.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Validate the configuration and open the session.
    ///
    /// Re-arms the cancellation token, so a stopped sink can be started
    /// again for a pause/resume cycle.
    pub async fn start(&mut self) -> Result<(), SinkError> {
        let cfg = self.config.snapshot();
        cfg.validate()?;
        self.cancel.reset();
        self.connection.open(&cfg.host, cfg.port).await
    }

    /// Cancel in-flight work and tear the session down.
    ///
    /// The socket is closed regardless of what state the connection
    /// reports, so stopping can never leak it.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.connection.close();
    }

    /// Encode and transmit one frame.
    ///
    /// Configuration is snapshotted once at frame start. A closed
    /// connection is reopened (fresh handshake) before encoding; a
    /// connection closed by the peer mid-send triggers at most one
    /// transparent reconnect, after which the remainder of this frame is
    /// delivered. Cancellation at any point yields
    /// [`FrameOutcome::Flushing`]; other failures abandon the frame and
    /// surface as errors.
    pub async fn send_frame(&mut self, frame: &FrameView<'_>) -> Result<FrameOutcome, SinkError> {
        let cfg = self.config.snapshot();

        if self.cancel.is_cancelled() {
            return Ok(FrameOutcome::Flushing);
        }

        if !self.connection.is_open() {
            cfg.validate()?;
            match self.connection.open(&cfg.host, cfg.port).await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => return Ok(FrameOutcome::Flushing),
                Err(e) => return Err(e),
            }
        }

        let outcome = self.stream_frame(frame, &cfg).await?;
        if outcome == FrameOutcome::Sent {
            match cfg.strategy {
                // The cache must hold what the server now displays, so it is
                // refreshed from the frame that actually went out.
                Strategy::Update => self.previous.update_from(frame),
                Strategy::FullFrame => self.previous.clear(),
            }
            tracing::debug!(
                frames_sent = self.metrics.snapshot().frames_sent,
                "frame delivered"
            );
        }
        Ok(outcome)
    }

    async fn stream_frame(
        &mut self,
        frame: &FrameView<'_>,
        cfg: &SinkConfig,
    ) -> Result<FrameOutcome, SinkError> {
        let offset = cfg.offset();
        let prev = if cfg.strategy == Strategy::Update && self.previous.matches(frame) {
            self.previous.view()
        } else {
            None
        };

        let Some((stream, canvas)) = self.connection.session_mut() else {
            return Err(SinkError::ConnectionClosed);
        };

        let mut commands = encode(*frame, prev, offset, canvas, cfg.strategy);
        let mut batcher = PacketBatcher::new(cfg.pixels_per_packet);

        match drive(&self.cancel, &mut commands, &mut batcher, stream).await {
            Ok(()) => {}
            Err(SinkError::Cancelled) => return Ok(FrameOutcome::Flushing),
            Err(SinkError::ConnectionClosed) => {
                tracing::warn!("peer closed the connection mid-frame, reconnecting once");
                match self.connection.open(&cfg.host, cfg.port).await {
                    Ok(()) => {}
                    Err(e) if e.is_cancelled() => return Ok(FrameOutcome::Flushing),
                    Err(e) => return Err(e),
                }

                // The rest of the frame keeps clipping against the canvas
                // snapshotted at frame start; the reconnected canvas applies
                // from the next frame on.
                let Some((stream, _)) = self.connection.session_mut() else {
                    return Err(SinkError::ConnectionClosed);
                };
                match drive(&self.cancel, &mut commands, &mut batcher, stream).await {
                    Ok(()) => {}
                    Err(SinkError::Cancelled) => return Ok(FrameOutcome::Flushing),
                    // A second failure, of any kind, is fatal for the frame.
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }

        self.metrics.record_frame(batcher.bytes_written());
        Ok(FrameOutcome::Sent)
    }
}

/// Push the remaining commands through the batcher into `stream`.
///
/// Starts by resending any packet retained from a failed flush, so the
/// same helper both begins a frame and resumes one after a reconnect.
async fn drive(
    cancel: &CancelToken,
    commands: &mut CommandIter<'_>,
    batcher: &mut PacketBatcher,
    stream: &mut TcpStream,
) -> Result<(), SinkError> {
    with_cancel(cancel, batcher.retry(stream), SinkError::from_write_error).await?;
    for cmd in commands.by_ref() {
        with_cancel(cancel, batcher.push(&cmd, stream), SinkError::from_write_error).await?;
    }
    with_cancel(cancel, batcher.finish(stream), SinkError::from_write_error).await
}
