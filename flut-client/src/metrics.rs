//! Transmission counters exposed to the host.

use parking_lot::Mutex;
use std::sync::Arc;

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Frames delivered in full.
    pub frames_sent: u64,
    /// Bytes actually transmitted (not merely encoded).
    pub bytes_written: u64,
}

/// Shared, monotonically increasing transmission counters.
///
/// Counters live for the process lifetime and are reset only when a new
/// connection is opened.
#[derive(Debug, Clone, Default)]
pub struct SinkMetrics {
    inner: Arc<Mutex<MetricsSnapshot>>,
}

impl SinkMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        *self.inner.lock()
    }

    /// Account one delivered frame and the bytes it put on the wire.
    pub(crate) fn record_frame(&self, bytes: u64) {
        let mut metrics = self.inner.lock();
        metrics.frames_sent += 1;
        metrics.bytes_written += bytes;
    }

    /// Zero the counters for a fresh connection.
    pub(crate) fn reset(&self) {
        *self.inner.lock() = MetricsSnapshot::default();
    }
}
