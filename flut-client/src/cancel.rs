//! Resettable cancellation token.

use crate::errors::SinkError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// A cancellation flag shared between the host's control path and the
/// streaming data path.
///
/// [`cancel`](Self::cancel) may be called from any thread and makes every
/// in-flight resolve/connect/send abort promptly with a distinguished
/// `Cancelled` outcome. [`reset`](Self::reset) re-arms the token so the
/// same sink can resume after a pause episode.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Create a token in the armed (not cancelled) state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { flag: Arc::new(tx) }
    }

    /// Request cancellation of all in-flight work on this token.
    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    /// Re-arm the token after a cancel episode.
    pub fn reset(&self) {
        self.flag.send_replace(false);
    }

    /// Whether cancellation is currently requested.
    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Wait until cancellation is requested.
    ///
    /// Returns immediately when the token is already cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives inside self, so the channel cannot close here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `fut` unless `cancel` fires first.
///
/// A cancelled operation yields [`SinkError::Cancelled`]; a completed one
/// has its error mapped through `map_err`.
pub(crate) async fn with_cancel<T, E, F>(
    cancel: &CancelToken,
    fut: F,
    map_err: impl FnOnce(E) -> SinkError,
) -> Result<T, SinkError>
where
    F: Future<Output = Result<T, E>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SinkError::Cancelled),
        result = fut => result.map_err(map_err),
    }
}
