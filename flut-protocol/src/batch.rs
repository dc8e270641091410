//! Grouping commands into fixed-size transmission chunks.

use crate::command::PixelCommand;
use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Accumulates serialized commands and flushes them in groups.
///
/// Lines pile up in an in-memory buffer until exactly `pixels_per_packet`
/// commands have accumulated, then the buffer goes to the sink as one
/// logical write. The write loops on partial progress until every byte is
/// confirmed or the sink errors; only confirmed bytes count towards
/// [`bytes_written`](Self::bytes_written).
///
/// The final partial group of a frame is flushed by
/// [`finish`](Self::finish) - a frame is only complete once every emitted
/// command reached the sink.
///
/// On a failed flush the accumulator is retained so the same packet can be
/// resent through [`retry`](Self::retry) against a replacement sink. The
/// failed write may have gone out partially; resending the whole packet is
/// harmless because draw commands are idempotent and the server ignores a
/// torn line.
#[derive(Debug)]
pub struct PacketBatcher {
    pixels_per_packet: u32,
    buf: BytesMut,
    pending: u32,
    bytes_written: u64,
}

impl PacketBatcher {
    /// Create a batcher flushing every `pixels_per_packet` commands.
    ///
    /// A granularity of zero degenerates to one command per packet.
    pub fn new(pixels_per_packet: u32) -> Self {
        Self {
            pixels_per_packet: pixels_per_packet.max(1),
            buf: BytesMut::new(),
            pending: 0,
            bytes_written: 0,
        }
    }

    /// Serialize one command, flushing to `sink` when the group is full.
    pub async fn push<W>(&mut self, cmd: &PixelCommand, sink: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        cmd.encode_into(&mut self.buf);
        self.pending += 1;
        if self.pending >= self.pixels_per_packet {
            self.flush(sink).await?;
        }
        Ok(())
    }

    /// Flush the final partial group at the end of a frame.
    pub async fn finish<W>(&mut self, sink: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        if self.pending > 0 {
            self.flush(sink).await?;
        }
        Ok(())
    }

    /// Resend a packet retained from a failed flush.
    ///
    /// A no-op when nothing is pending, so it is safe to call
    /// unconditionally before resuming [`push`](Self::push).
    pub async fn retry<W>(&mut self, sink: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        if !self.buf.is_empty() {
            self.flush(sink).await?;
        }
        Ok(())
    }

    async fn flush<W>(&mut self, sink: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        sink.write_all(&self.buf).await?;
        self.bytes_written += self.buf.len() as u64;
        self.buf.clear();
        self.pending = 0;
        Ok(())
    }

    /// Bytes confirmed written to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Whether a group (possibly a retained failed packet) is buffered.
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }
}
