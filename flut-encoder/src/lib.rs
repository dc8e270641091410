//! Turning a frame into a sequence of draw commands.
//!
//! The encoder walks a [`FrameView`](flut_frame::FrameView) row-major and
//! emits one [`PixelCommand`](flut_protocol::PixelCommand) per pixel that
//! survives clipping and the skip rules. The walk order is part of the
//! contract: it fixes the order in which pixels hit the wire.

pub mod encode;

pub use encode::{encode, CommandIter, Strategy};
