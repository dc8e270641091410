//! Per-pixel byte layouts for the packed RGB/RGBA formats the host may feed.
//!
//! The host guarantees frames arrive already converted to one of a fixed set
//! of packed layouts; this module names those layouts and records where each
//! channel byte lives inside a pixel. Format negotiation itself happens
//! upstream and is not this crate's concern.

use thiserror::Error;

/// Errors raised when a frame description is inconsistent with its data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The declared row stride cannot hold a full row of pixels.
    #[error("plane stride {plane_stride} too small for {width} pixels of {pixel_stride} bytes")]
    StrideTooSmall {
        plane_stride: usize,
        width: u32,
        pixel_stride: usize,
    },

    /// The supplied buffer is shorter than the declared geometry requires.
    #[error("buffer holds {actual} bytes but the declared geometry needs {required}")]
    BufferTooSmall { required: usize, actual: usize },

    /// A channel byte offset points outside the pixel.
    #[error("channel offset {offset} outside the {pixel_stride}-byte pixel")]
    ChannelOffsetOutOfRange { offset: usize, pixel_stride: usize },
}

/// Byte layout of one packed pixel.
///
/// `pixel_stride` is the number of bytes per pixel; the channel fields give
/// the byte offset of each channel within a pixel. Use the named constructors
/// for the supported formats rather than building layouts by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelLayout {
    /// Bytes per pixel, including any padding byte.
    pub pixel_stride: usize,
    /// Byte offset of the red channel.
    pub red: usize,
    /// Byte offset of the green channel.
    pub green: usize,
    /// Byte offset of the blue channel.
    pub blue: usize,
    /// Byte offset of the alpha channel, if the format carries one.
    pub alpha: Option<usize>,
}

impl PixelLayout {
    /// 24-bit packed RGB.
    pub const fn rgb() -> Self {
        Self { pixel_stride: 3, red: 0, green: 1, blue: 2, alpha: None }
    }

    /// 24-bit packed BGR.
    pub const fn bgr() -> Self {
        Self { pixel_stride: 3, red: 2, green: 1, blue: 0, alpha: None }
    }

    /// 32-bit RGB with a trailing padding byte.
    pub const fn rgbx() -> Self {
        Self { pixel_stride: 4, red: 0, green: 1, blue: 2, alpha: None }
    }

    /// 32-bit BGR with a trailing padding byte.
    pub const fn bgrx() -> Self {
        Self { pixel_stride: 4, red: 2, green: 1, blue: 0, alpha: None }
    }

    /// 32-bit RGB with a leading padding byte.
    pub const fn xrgb() -> Self {
        Self { pixel_stride: 4, red: 1, green: 2, blue: 3, alpha: None }
    }

    /// 32-bit BGR with a leading padding byte.
    pub const fn xbgr() -> Self {
        Self { pixel_stride: 4, red: 3, green: 2, blue: 1, alpha: None }
    }

    /// 32-bit RGBA.
    pub const fn rgba() -> Self {
        Self { pixel_stride: 4, red: 0, green: 1, blue: 2, alpha: Some(3) }
    }

    /// 32-bit BGRA.
    pub const fn bgra() -> Self {
        Self { pixel_stride: 4, red: 2, green: 1, blue: 0, alpha: Some(3) }
    }

    /// 32-bit ARGB.
    pub const fn argb() -> Self {
        Self { pixel_stride: 4, red: 1, green: 2, blue: 3, alpha: Some(0) }
    }

    /// 32-bit ABGR.
    pub const fn abgr() -> Self {
        Self { pixel_stride: 4, red: 3, green: 2, blue: 1, alpha: Some(0) }
    }

    /// Whether this layout carries an alpha channel.
    pub const fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    /// Check that every channel offset lies inside the pixel.
    pub fn validate(&self) -> Result<(), FrameError> {
        let offsets = [Some(self.red), Some(self.green), Some(self.blue), self.alpha];
        for offset in offsets.into_iter().flatten() {
            if offset >= self.pixel_stride {
                return Err(FrameError::ChannelOffsetOutOfRange {
                    offset,
                    pixel_stride: self.pixel_stride,
                });
            }
        }
        Ok(())
    }
}
