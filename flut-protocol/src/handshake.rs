//! The once-per-connection `SIZE` query/response.
//!
//! Immediately after connecting, the client sends the literal bytes
//! `SIZE\n` and reads back one line of the form `SIZE <width> <height>`.
//! The reported dimensions become the [`Canvas`] used to clip every
//! coordinate for the lifetime of that connection.

use crate::error::ProtocolError;
use flut_common::Canvas;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// The canvas size query, sent verbatim.
pub const SIZE_REQUEST: &[u8; 5] = b"SIZE\n";

/// Replies shorter than this cannot name a canvas.
const MIN_REPLY_LEN: usize = 8;

/// Upper bound on the reply line; anything longer is not a size reply.
const MAX_REPLY_LEN: usize = 64;

/// Perform the canvas-size handshake on a fresh connection.
///
/// # Errors
///
/// Returns [`ProtocolError::ShortSizeReply`] when the peer closes before a
/// full line arrives or the line is too short to parse,
/// [`ProtocolError::MalformedSizeReply`] when the line does not match
/// `SIZE <width> <height>`, and [`ProtocolError::Io`] for transport errors.
pub async fn request_canvas_size<S>(stream: &mut S) -> Result<Canvas, ProtocolError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(SIZE_REQUEST).await?;
    let line = read_reply_line(stream).await?;
    parse_size_reply(&line)
}

/// Read one newline-terminated reply line.
///
/// The handshake happens once per connection, so a byte-at-a-time read is
/// fine and avoids buffering past the line end.
async fn read_reply_line<R: AsyncRead + Unpin>(stream: &mut R) -> Result<String, ProtocolError> {
    let mut line = Vec::with_capacity(MAX_REPLY_LEN);
    loop {
        let mut byte = [0u8; 1];
        if stream.read(&mut byte).await? == 0 {
            return Err(ProtocolError::ShortSizeReply(line.len()));
        }
        if byte[0] == b'\n' {
            break;
        }
        line.push(byte[0]);
        if line.len() > MAX_REPLY_LEN {
            let text = String::from_utf8_lossy(&line).into_owned();
            return Err(ProtocolError::MalformedSizeReply(text));
        }
    }
    String::from_utf8(line)
        .map_err(|e| ProtocolError::MalformedSizeReply(String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

/// Parse a reply line (without the trailing newline) into a [`Canvas`].
pub fn parse_size_reply(line: &str) -> Result<Canvas, ProtocolError> {
    if line.len() < MIN_REPLY_LEN {
        return Err(ProtocolError::ShortSizeReply(line.len()));
    }

    let malformed = || ProtocolError::MalformedSizeReply(line.to_string());
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("SIZE"), Some(width), Some(height), None) => Ok(Canvas::new(
            width.parse().map_err(|_| malformed())?,
            height.parse().map_err(|_| malformed())?,
        )),
        _ => Err(malformed()),
    }
}
