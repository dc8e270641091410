//! The Pixelflut wire protocol.
//!
//! Pixelflut is a text protocol: every message is one newline-terminated
//! ASCII line. A client paints by flooding the server with `PX <x> <y>
//! <color>` lines; the only query used here is `SIZE`, which the server
//! answers with its canvas dimensions.
//!
//! # Modules
//!
//! - [`command`] - the `PX` draw command and its line grammar
//! - [`handshake`] - the once-per-connection `SIZE` query/response
//! - [`socket`] - TCP resolve/connect helpers
//! - [`batch`] - grouping commands into fixed-size transmission chunks
//!
//! # Examples
//!
//! ```
//! use flut_protocol::{Color, PixelCommand};
//!
//! let cmd = PixelCommand::new(12, 34, Color::Rgb([0xff, 0x80, 0x00]));
//! assert_eq!(cmd.to_string(), "PX 12 34 ff8000");
//! ```

pub mod batch;
pub mod command;
pub mod error;
pub mod handshake;
pub mod socket;

pub use batch::PacketBatcher;
pub use command::{Color, PixelCommand};
pub use error::ProtocolError;
pub use handshake::request_canvas_size;
