//! Request Channel: ordered URL hand-off from the foreground to the worker.
//!
//! The queue is unbounded so sending never blocks: the foreground only ever
//! waits in its multiplexed wait, even while the worker is busy with a long
//! transfer. The worker awaits the receiver inside its unified wait, which
//! makes a new request wake an idle worker immediately.

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Request channel failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The worker dropped its receiver; the request was not delivered.
    #[error("fetch worker is gone, request for {url:?} not delivered")]
    Closed {
        /// URL of the undelivered request.
        url: String,
    },
}

/// A URL on its way to the fetch worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Submission sequence number, starting at 0.
    pub seq: u64,
    /// The URL exactly as typed.
    pub url: String,
}

/// Create a connected request sender/receiver pair.
pub fn request_channel() -> (RequestSender, RequestReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RequestSender { tx, next_seq: 0 }, RequestReceiver { rx })
}

/// Sending side, owned by the foreground.
#[derive(Debug)]
pub struct RequestSender {
    tx: mpsc::UnboundedSender<PendingRequest>,
    next_seq: u64,
}

impl RequestSender {
    /// Hand `url` to the worker. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the worker is no longer receiving.
    pub fn send(&mut self, url: impl Into<String>) -> Result<u64, ChannelError> {
        let request = PendingRequest {
            seq: self.next_seq,
            url: url.into(),
        };
        let seq = request.seq;

        self.tx
            .send(request)
            .map_err(|rejected| ChannelError::Closed { url: rejected.0.url })?;
        self.next_seq += 1;

        tracing::debug!(seq, "request queued");
        Ok(seq)
    }
}

/// Receiving side, owned by the fetch worker.
#[derive(Debug)]
pub struct RequestReceiver {
    rx: mpsc::UnboundedReceiver<PendingRequest>,
}

impl RequestReceiver {
    /// Wait for the next request. `None` once every sender is gone and the
    /// queue is empty.
    pub async fn recv(&mut self) -> Option<PendingRequest> {
        self.rx.recv().await
    }

    /// Take the next request if one is queued, without waiting.
    pub fn try_recv(&mut self) -> Option<PendingRequest> {
        match self.rx.try_recv() {
            Ok(request) => Some(request),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Take every request still queued.
    pub fn drain(&mut self) -> Vec<PendingRequest> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
