//! The `PX` draw command and its line grammar.
//!
//! One command paints one pixel:
//!
//! ```text
//! PX <x> <y> <rrggbb>\n
//! PX <x> <y> <rrggbbaa>\n
//! ```
//!
//! Coordinates are decimal and may be negative (offset arithmetic can push
//! pixels off the left or top edge; the server discards those itself). The
//! color is exactly 6 or 8 lowercase hex digits.

use crate::error::ProtocolError;
use bytes::BytesMut;
use std::fmt;
use std::str::FromStr;

/// A pixel color, with or without alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// Opaque color, rendered as 6 hex digits.
    Rgb([u8; 3]),
    /// Color with alpha, rendered as 8 hex digits.
    Rgba([u8; 4]),
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Rgb([r, g, b]) => write!(f, "{r:02x}{g:02x}{b:02x}"),
            Color::Rgba([r, g, b, a]) => write!(f, "{r:02x}{g:02x}{b:02x}{a:02x}"),
        }
    }
}

impl FromStr for Color {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ProtocolError::MalformedCommand(s.to_string());
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(malformed());
        }
        match s.len() {
            6 => {
                let v = u32::from_str_radix(s, 16).map_err(|_| malformed())?;
                Ok(Color::Rgb([(v >> 16) as u8, (v >> 8) as u8, v as u8]))
            }
            8 => {
                let v = u32::from_str_radix(s, 16).map_err(|_| malformed())?;
                Ok(Color::Rgba([
                    (v >> 24) as u8,
                    (v >> 16) as u8,
                    (v >> 8) as u8,
                    v as u8,
                ]))
            }
            _ => Err(malformed()),
        }
    }
}

/// One draw instruction: absolute canvas coordinates plus a color.
///
/// Commands are value objects; they are produced by the encoder, serialized
/// by the batcher and then discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCommand {
    pub x: i32,
    pub y: i32,
    pub color: Color,
}

impl PixelCommand {
    /// Create a new draw command.
    pub const fn new(x: i32, y: i32, color: Color) -> Self {
        Self { x, y, color }
    }

    /// Append this command's wire line, newline included, to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        use std::fmt::Write;
        // BytesMut's fmt::Write never fails.
        writeln!(buf, "{}", self).expect("infallible write into BytesMut");
    }
}

impl fmt::Display for PixelCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PX {} {} {}", self.x, self.y, self.color)
    }
}

impl FromStr for PixelCommand {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ProtocolError::MalformedCommand(s.to_string());
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("PX"), Some(x), Some(y), Some(color), None) => Ok(Self {
                x: x.parse().map_err(|_| malformed())?,
                y: y.parse().map_err(|_| malformed())?,
                color: color.parse()?,
            }),
            _ => Err(malformed()),
        }
    }
}
