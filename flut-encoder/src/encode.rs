//! The frame-to-commands encoder.

use flut_common::{Canvas, Offset};
use flut_frame::FrameView;
use flut_protocol::{Color, PixelCommand};
use serde::{Deserialize, Serialize};

/// How a frame is turned into commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Emit one command per non-fully-transparent pixel.
    #[default]
    FullFrame,
    /// Additionally suppress pixels whose RGB bytes are unchanged from the
    /// previous sent frame.
    Update,
}

/// Encode `frame` into a lazy command sequence.
///
/// Pixels are visited top-to-bottom, left-to-right. For each pixel, in
/// order:
///
/// 1. the target coordinate (source plus `offset`) is clipped against
///    `canvas` - strictly past the reported edge is dropped, the edge
///    itself is kept;
/// 2. a pixel whose alpha byte is exactly zero is dropped, whatever the
///    strategy;
/// 3. under [`Strategy::Update`], a pixel whose R, G, B bytes are
///    bit-identical to `prev` at the same coordinate is dropped (alpha is
///    not compared);
/// 4. what remains becomes a [`PixelCommand`] carrying RGB, or RGBA when
///    the frame has an alpha channel.
///
/// `prev` only participates when the strategy is `Update` and its geometry
/// and layout match `frame`; otherwise the frame is encoded in full. The
/// returned iterator is finite, single-pass and not restartable -
/// re-encoding means calling this again with the same inputs.
pub fn encode<'a>(
    frame: FrameView<'a>,
    prev: Option<FrameView<'a>>,
    offset: Offset,
    canvas: Canvas,
    strategy: Strategy,
) -> CommandIter<'a> {
    let prev = match strategy {
        Strategy::Update => prev.filter(|p| {
            p.width() == frame.width()
                && p.height() == frame.height()
                && p.layout() == frame.layout()
        }),
        Strategy::FullFrame => None,
    };

    CommandIter {
        frame,
        prev,
        offset,
        canvas,
        x: 0,
        y: 0,
    }
}

/// Lazy iterator over one frame's draw commands.
///
/// Bounded by `width * height` items; see [`encode`] for the emission
/// rules.
#[derive(Debug, Clone)]
pub struct CommandIter<'a> {
    frame: FrameView<'a>,
    prev: Option<FrameView<'a>>,
    offset: Offset,
    canvas: Canvas,
    x: u32,
    y: u32,
}

impl Iterator for CommandIter<'_> {
    type Item = PixelCommand;

    fn next(&mut self) -> Option<PixelCommand> {
        if self.frame.width() == 0 {
            return None;
        }

        while self.y < self.frame.height() {
            let (x, y) = (self.x, self.y);
            self.x += 1;
            if self.x == self.frame.width() {
                self.x = 0;
                self.y += 1;
            }

            let tx = x as i32 + self.offset.left;
            let ty = y as i32 + self.offset.top;
            if !self.canvas.admits(tx, ty) {
                continue;
            }

            let alpha = self.frame.alpha(x, y);
            if alpha == Some(0) {
                continue;
            }

            let rgb = self.frame.rgb(x, y);
            if let Some(prev) = &self.prev {
                if prev.rgb(x, y) == rgb {
                    continue;
                }
            }

            let color = match alpha {
                Some(a) => Color::Rgba([rgb[0], rgb[1], rgb[2], a]),
                None => Color::Rgb(rgb),
            };
            return Some(PixelCommand::new(tx, ty, color));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self.frame.width() as u64 * self.frame.height() as u64;
        let visited = self.y as u64 * self.frame.width() as u64 + self.x as u64;
        (0, Some(total.saturating_sub(visited.min(total)) as usize))
    }
}
