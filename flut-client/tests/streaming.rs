//! Integration tests for the streaming sink against an in-process mock
//! Pixelflut server.
//!
//! The mock server answers the `SIZE` handshake, then either captures
//! everything the client sends or drops the connection to provoke the
//! reconnect path.

use anyhow::Result;
use flut_client::{
    Canvas, FrameOutcome, Offset, SharedConfig, SinkConfig, SinkError, Strategy, StreamingSink,
};
use flut_frame::{FrameView, PixelLayout};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Per-connection behavior of the mock server.
#[derive(Debug, Clone, Copy)]
enum Conduct {
    /// Handshake, then capture bytes until the client closes.
    Serve,
    /// Handshake, then immediately drop the connection.
    DropAfterHandshake,
}

struct MockServer {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    captures: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MockServer {
    /// Spawn a server handling one connection per `script` entry.
    async fn spawn(size_reply: &'static str, script: Vec<Conduct>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let (tx, captures) = mpsc::unbounded_channel();

        let counter = accepted.clone();
        tokio::spawn(async move {
            for conduct in script {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let mut query = [0u8; 5];
                stream.read_exact(&mut query).await.unwrap();
                assert_eq!(&query, b"SIZE\n");
                stream.write_all(size_reply.as_bytes()).await.unwrap();

                match conduct {
                    Conduct::DropAfterHandshake => drop(stream),
                    Conduct::Serve => {
                        let mut data = Vec::new();
                        let _ = stream.read_to_end(&mut data).await;
                        let _ = tx.send(data);
                    }
                }
            }
        });

        Self {
            addr,
            accepted,
            captures,
        }
    }

    fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    async fn next_capture(&mut self) -> String {
        let data = self.captures.recv().await.expect("server capture");
        String::from_utf8(data).expect("ascii protocol")
    }
}

fn sink_for(server: &MockServer, configure: impl FnOnce(SinkConfig) -> SinkConfig) -> StreamingSink {
    let config = configure(
        SinkConfig::builder()
            .host(server.addr.ip().to_string())
            .port(server.addr.port())
            .build()
            .unwrap(),
    );
    StreamingSink::new(SharedConfig::new(config))
}

#[tokio::test]
async fn test_start_learns_canvas_size() -> Result<()> {
    init_logging();
    let server = MockServer::spawn("SIZE 800 600\n", vec![Conduct::Serve]).await;
    let mut sink = sink_for(&server, |c| c);

    assert!(sink.canvas().is_none());
    sink.start().await?;
    assert_eq!(sink.canvas(), Some(Canvas::new(800, 600)));
    assert_eq!(sink.metrics().frames_sent, 0);

    sink.stop();
    Ok(())
}

#[tokio::test]
async fn test_bad_handshake_is_fatal() {
    init_logging();
    let server = MockServer::spawn("NOPE\n", vec![Conduct::Serve]).await;
    let mut sink = sink_for(&server, |c| c);

    let err = sink.start().await.unwrap_err();
    assert!(matches!(err, SinkError::Handshake(_)));
    assert!(!err.is_cancelled());
}

#[tokio::test]
async fn test_empty_host_rejected_before_connecting() {
    init_logging();
    let mut sink = StreamingSink::new(SharedConfig::new(SinkConfig::default()));
    let err = sink.start().await.unwrap_err();
    assert!(matches!(err, SinkError::Config(_)));
}

#[tokio::test]
async fn test_full_frame_row_major_wire_content() -> Result<()> {
    init_logging();
    let mut server = MockServer::spawn("SIZE 800 600\n", vec![Conduct::Serve]).await;
    let mut sink = sink_for(&server, |mut c| {
        c.pixels_per_packet = 3; // forces one full packet plus a remainder
        c
    });
    sink.start().await?;

    let data = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
    let frame = FrameView::new(2, 2, 6, PixelLayout::rgb(), &data)?;
    assert_eq!(sink.send_frame(&frame).await?, FrameOutcome::Sent);

    let expected = "PX 0 0 010203\nPX 1 0 040506\nPX 0 1 070809\nPX 1 1 0a0b0c\n";
    assert_eq!(sink.metrics().frames_sent, 1);
    assert_eq!(sink.metrics().bytes_written, expected.len() as u64);

    sink.stop();
    assert_eq!(server.next_capture().await, expected);
    Ok(())
}

#[tokio::test]
async fn test_offset_and_canvas_clipping_on_the_wire() -> Result<()> {
    init_logging();
    let mut server = MockServer::spawn("SIZE 4 4\n", vec![Conduct::Serve]).await;
    let mut sink = sink_for(&server, |c| c);
    sink.start().await?;

    // Two pixels shifted so the first lands on the canvas edge and the
    // second past it.
    sink.config().set_offset(Offset::new(4, 1));
    let data = [0xaa_u8, 0xbb, 0xcc, 0x11, 0x22, 0x33];
    let frame = FrameView::new(2, 1, 6, PixelLayout::rgb(), &data)?;
    assert_eq!(sink.send_frame(&frame).await?, FrameOutcome::Sent);

    sink.stop();
    assert_eq!(server.next_capture().await, "PX 4 1 aabbcc\n");
    Ok(())
}

#[tokio::test]
async fn test_update_strategy_sends_only_changes() -> Result<()> {
    init_logging();
    let mut server = MockServer::spawn("SIZE 800 600\n", vec![Conduct::Serve]).await;
    let mut sink = sink_for(&server, |mut c| {
        c.strategy = Strategy::Update;
        c
    });
    sink.start().await?;

    let first = [1u8, 2, 3, 4, 5, 6];
    let frame = FrameView::new(2, 1, 6, PixelLayout::rgb(), &first)?;
    assert_eq!(sink.send_frame(&frame).await?, FrameOutcome::Sent);

    // Identical content again: nothing new on the wire, still a sent frame.
    let bytes_after_first = sink.metrics().bytes_written;
    assert_eq!(sink.send_frame(&frame).await?, FrameOutcome::Sent);
    assert_eq!(sink.metrics().bytes_written, bytes_after_first);

    // One pixel changed: exactly one command goes out.
    let second = [1u8, 2, 3, 4, 5, 99];
    let changed = FrameView::new(2, 1, 6, PixelLayout::rgb(), &second)?;
    assert_eq!(sink.send_frame(&changed).await?, FrameOutcome::Sent);

    assert_eq!(sink.metrics().frames_sent, 3);
    sink.stop();
    assert_eq!(
        server.next_capture().await,
        "PX 0 0 010203\nPX 1 0 040506\nPX 1 0 040563\n"
    );
    Ok(())
}

/// A 32x32 RGB frame big enough that a dead connection is noticed
/// mid-send.
fn large_frame_bytes() -> Vec<u8> {
    let mut data = Vec::with_capacity(32 * 32 * 3);
    for y in 0..32u8 {
        for x in 0..32u8 {
            data.extend_from_slice(&[x, y, 0xab]);
        }
    }
    data
}

#[tokio::test]
async fn test_reconnect_resumes_frame_after_peer_close() -> Result<()> {
    init_logging();
    let mut server = MockServer::spawn(
        "SIZE 800 600\n",
        vec![Conduct::DropAfterHandshake, Conduct::Serve],
    )
    .await;
    let mut sink = sink_for(&server, |mut c| {
        c.pixels_per_packet = 16;
        c
    });
    sink.start().await?;

    let data = large_frame_bytes();
    let frame = FrameView::new(32, 32, 32 * 3, PixelLayout::rgb(), &data)?;
    assert_eq!(sink.send_frame(&frame).await?, FrameOutcome::Sent);

    // Exactly one reconnect: the dropped session plus its replacement.
    assert_eq!(server.accepted(), 2);
    assert_eq!(sink.metrics().frames_sent, 1);

    sink.stop();
    let resumed = server.next_capture().await;
    // The replacement connection received the tail of the frame, through
    // to the very last pixel.
    assert!(resumed.ends_with("PX 31 31 1f1fab\n"));
    Ok(())
}

#[tokio::test]
async fn test_second_peer_close_is_fatal() -> Result<()> {
    init_logging();
    let server = MockServer::spawn(
        "SIZE 800 600\n",
        vec![Conduct::DropAfterHandshake, Conduct::DropAfterHandshake],
    )
    .await;
    let mut sink = sink_for(&server, |mut c| {
        c.pixels_per_packet = 16;
        c
    });
    sink.start().await?;

    let data = large_frame_bytes();
    let frame = FrameView::new(32, 32, 32 * 3, PixelLayout::rgb(), &data)?;
    let err = sink.send_frame(&frame).await.unwrap_err();

    assert!(matches!(err, SinkError::ConnectionClosed));
    assert_eq!(server.accepted(), 2);
    Ok(())
}

#[tokio::test]
async fn test_stopped_sink_reports_flushing() -> Result<()> {
    init_logging();
    let server = MockServer::spawn("SIZE 800 600\n", vec![Conduct::Serve]).await;
    let mut sink = sink_for(&server, |c| c);
    sink.start().await?;
    sink.stop();

    let data = [1u8, 2, 3];
    let frame = FrameView::new(1, 1, 3, PixelLayout::rgb(), &data)?;
    assert_eq!(sink.send_frame(&frame).await?, FrameOutcome::Flushing);
    assert_eq!(sink.metrics().frames_sent, 0);
    Ok(())
}

#[tokio::test]
async fn test_stop_and_restart_cycle() -> Result<()> {
    init_logging();
    let mut server =
        MockServer::spawn("SIZE 800 600\n", vec![Conduct::Serve, Conduct::Serve]).await;
    let mut sink = sink_for(&server, |c| c);

    sink.start().await?;
    let data = [1u8, 2, 3];
    let frame = FrameView::new(1, 1, 3, PixelLayout::rgb(), &data)?;
    assert_eq!(sink.send_frame(&frame).await?, FrameOutcome::Sent);
    sink.stop();
    assert_eq!(server.next_capture().await, "PX 0 0 010203\n");

    // A stopped sink can be started again: the token re-arms and a fresh
    // handshake runs.
    sink.start().await?;
    assert_eq!(sink.send_frame(&frame).await?, FrameOutcome::Sent);
    assert_eq!(sink.metrics().frames_sent, 1);
    sink.stop();
    assert_eq!(server.next_capture().await, "PX 0 0 010203\n");

    assert_eq!(server.accepted(), 2);
    Ok(())
}
