//! Owned frame copy used as the change-detection cache.

use crate::layout::PixelLayout;
use crate::view::FrameView;

/// An owned snapshot of the most recently sent frame.
///
/// Change detection diffs the current frame against the pixels that actually
/// went out on the wire, so the cache is refreshed from the sent frame's
/// bytes after every successful transmission. The backing allocation is
/// reused across frames of the same geometry.
#[derive(Debug, Clone, Default)]
pub struct FrameStore {
    width: u32,
    height: u32,
    plane_stride: usize,
    layout: Option<PixelLayout>,
    data: Vec<u8>,
}

impl FrameStore {
    /// Create an empty store; [`update_from`](Self::update_from) fills it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the store currently holds a frame.
    pub fn is_empty(&self) -> bool {
        self.layout.is_none()
    }

    /// Whether the stored frame can be diffed against `frame`.
    ///
    /// Diffing requires identical dimensions and pixel layout; the row
    /// stride may differ because pixels are addressed through it.
    pub fn matches(&self, frame: &FrameView<'_>) -> bool {
        self.layout == Some(frame.layout())
            && self.width == frame.width()
            && self.height == frame.height()
    }

    /// Replace the stored frame with a full copy of `frame`'s pixel bytes.
    pub fn update_from(&mut self, frame: &FrameView<'_>) {
        self.width = frame.width();
        self.height = frame.height();
        self.plane_stride = frame.plane_stride();
        self.layout = Some(frame.layout());
        self.data.clear();
        self.data.extend_from_slice(frame.bytes());
    }

    /// Drop the stored frame, keeping the allocation for reuse.
    pub fn clear(&mut self) {
        self.layout = None;
        self.data.clear();
    }

    /// Re-borrow the stored frame for the next encode, if one is present.
    pub fn view(&self) -> Option<FrameView<'_>> {
        self.layout.map(|layout| {
            FrameView::from_parts_unchecked(
                self.width,
                self.height,
                self.plane_stride,
                layout,
                &self.data,
            )
        })
    }
}
