//! Sink configuration, shared between the host and the streaming cycle.

use crate::errors::SinkError;
use flut_common::Offset;
use flut_encoder::Strategy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Host-facing configuration for the streaming sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Pixelflut server host name or literal address.
    pub host: String,

    /// Pixelflut server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Horizontal displacement added to every emitted x coordinate.
    #[serde(default)]
    pub offset_left: i32,

    /// Vertical displacement added to every emitted y coordinate.
    #[serde(default)]
    pub offset_top: i32,

    /// How many commands are concatenated into one transmission.
    #[serde(default = "default_pixels_per_packet")]
    pub pixels_per_packet: u32,

    /// Encoding strategy.
    #[serde(default)]
    pub strategy: Strategy,
}

fn default_port() -> u16 {
    1337
}

fn default_pixels_per_packet() -> u32 {
    64
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            offset_left: 0,
            offset_top: 0,
            pixels_per_packet: default_pixels_per_packet(),
            strategy: Strategy::default(),
        }
    }
}

impl SinkConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> SinkConfigBuilder {
        SinkConfigBuilder::default()
    }

    /// The offset as a value object.
    #[must_use]
    pub fn offset(&self) -> Offset {
        Offset::new(self.offset_left, self.offset_top)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Config`] when a field is unusable.
    pub fn validate(&self) -> Result<(), SinkError> {
        if self.host.is_empty() {
            return Err(SinkError::Config("host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(SinkError::Config("port cannot be 0".to_string()));
        }
        if self.pixels_per_packet == 0 {
            return Err(SinkError::Config(
                "pixels-per-packet cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for creating a [`SinkConfig`].
#[derive(Debug, Default)]
pub struct SinkConfigBuilder {
    config: SinkConfig,
}

impl SinkConfigBuilder {
    /// Sets the server host name or literal address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the pixel offset.
    #[must_use]
    pub fn offset(mut self, left: i32, top: i32) -> Self {
        self.config.offset_left = left;
        self.config.offset_top = top;
        self
    }

    /// Sets the batching granularity.
    #[must_use]
    pub fn pixels_per_packet(mut self, pixels: u32) -> Self {
        self.config.pixels_per_packet = pixels;
        self
    }

    /// Sets the encoding strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<SinkConfig, SinkError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Shared, lock-guarded configuration.
///
/// The host's control path mutates fields at any time; the streaming cycle
/// takes one [`snapshot`](Self::snapshot) at the start of each frame and
/// works from that, so a mid-frame change never produces a torn read and
/// never applies retroactively.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<Mutex<SinkConfig>>,
}

impl SharedConfig {
    /// Wrap a configuration for sharing.
    pub fn new(config: SinkConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }

    /// Copy the current configuration.
    pub fn snapshot(&self) -> SinkConfig {
        self.inner.lock().clone()
    }

    /// Move the painting offset.
    pub fn set_offset(&self, offset: Offset) {
        let mut config = self.inner.lock();
        config.offset_left = offset.left;
        config.offset_top = offset.top;
    }

    /// Change the batching granularity.
    pub fn set_pixels_per_packet(&self, pixels: u32) {
        self.inner.lock().pixels_per_packet = pixels;
    }

    /// Change the encoding strategy.
    pub fn set_strategy(&self, strategy: Strategy) {
        self.inner.lock().strategy = strategy;
    }

    /// Apply an arbitrary mutation under the lock.
    pub fn update(&self, f: impl FnOnce(&mut SinkConfig)) {
        f(&mut self.inner.lock());
    }
}
