//! Streaming client for Pixelflut servers.
//!
//! This crate ties the lower layers together into the per-frame streaming
//! cycle: the host hands over one decoded frame at a time, the sink encodes
//! it into `PX` commands, batches them into packets and pushes them over a
//! persistent TCP connection, reconnecting transparently when the server
//! drops the session mid-frame.
//!
//! # Quick Start
//!
//! ```no_run
//! use flut_client::{FrameOutcome, SharedConfig, SinkConfig, StreamingSink};
//! use flut_frame::{FrameView, PixelLayout};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SinkConfig::builder()
//!         .host("pixelflut.example")
//!         .port(1337)
//!         .build()?;
//!     let mut sink = StreamingSink::new(SharedConfig::new(config));
//!     sink.start().await?;
//!
//!     let pixels = vec![0u8; 64 * 64 * 4];
//!     let frame = FrameView::new(64, 64, 64 * 4, PixelLayout::rgbx(), &pixels)?;
//!     match sink.send_frame(&frame).await? {
//!         FrameOutcome::Sent => println!("painted {} bytes", sink.metrics().bytes_written),
//!         FrameOutcome::Flushing => println!("sink is flushing"),
//!     }
//!
//!     sink.stop();
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency model
//!
//! Exactly one frame is in flight at a time; the sink spawns no tasks. The
//! host's control path talks to a running sink through two thread-safe
//! handles: [`SharedConfig`] for mutation (offset moves, granularity) and
//! [`CancelToken`] to unblock socket I/O early. Configuration is
//! snapshotted at frame start and never read torn mid-encode.

pub mod cancel;
pub mod config;
pub mod connection;
pub mod errors;
pub mod metrics;
pub mod sink;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use config::{SharedConfig, SinkConfig, SinkConfigBuilder};
pub use connection::{ConnectionManager, ConnectionState};
pub use errors::SinkError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sink::{FrameOutcome, StreamingSink};

// Convenience re-exports from the lower layers
pub use flut_common::{Canvas, Offset};
pub use flut_encoder::Strategy;
