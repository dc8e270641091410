//! Pixel buffer descriptions for the Pixelflut sink.
//!
//! This crate describes one fully decoded video frame as the host hands it
//! over: the raw plane bytes plus the layout metadata needed to find each
//! pixel's channels. It does no I/O.
//!
//! - [`PixelLayout`] - per-pixel byte layout for the supported packed formats
//! - [`FrameView`] - borrowed, read-only view of one frame's plane
//! - [`FrameStore`] - owned copy of a frame, used as the change-detection cache

pub mod layout;
pub mod store;
pub mod view;

pub use layout::{FrameError, PixelLayout};
pub use store::FrameStore;
pub use view::FrameView;
