//! Redraw Notification Channel: payload-free wake-ups for the foreground.
//!
//! Posting never blocks. When the channel is already full a wake-up is
//! pending anyway, so the new signal coalesces into it. The foreground
//! recomputes the whole frame on every wake, so how many signals were
//! posted does not matter, only whether at least one was.

use bitflags::bitflags;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::time::Duration;

/// Pending signals kept before further posts coalesce.
const REDRAW_SLOTS: usize = 8;

bitflags! {
    /// Why the foreground was asked to redraw.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RedrawCause: u8 {
        /// A transfer finished and a response was published.
        const DATA = 0b0000_0001;
        /// The terminal was resized.
        const RESIZE = 0b0000_0010;
    }
}

/// Create a connected redraw sender/receiver pair.
pub fn redraw_channel() -> (RedrawSender, RedrawReceiver) {
    let (tx, rx) = bounded(REDRAW_SLOTS);
    (RedrawSender { tx }, RedrawReceiver { rx })
}

/// Posting side, held by the fetch worker and the resize source.
#[derive(Debug, Clone)]
pub struct RedrawSender {
    tx: Sender<RedrawCause>,
}

impl RedrawSender {
    /// Ask the foreground to redraw.
    ///
    /// Never blocks. A full channel coalesces the signal; a disconnected
    /// channel means the foreground is gone and the signal is moot.
    pub fn notify(&self, cause: RedrawCause) {
        match self.tx.try_send(cause) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::trace!(?cause, "redraw signal coalesced");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::trace!(?cause, "redraw signal dropped, receiver gone");
            }
        }
    }
}

/// Receiving side, owned by the foreground loop.
#[derive(Debug)]
pub struct RedrawReceiver {
    rx: Receiver<RedrawCause>,
}

impl RedrawReceiver {
    /// The underlying receiver, for use in `select!`.
    pub const fn receiver(&self) -> &Receiver<RedrawCause> {
        &self.rx
    }

    /// Consume every pending signal and return the union of their causes.
    ///
    /// After this returns, a zero-timeout [`wait`](Self::wait) reports
    /// nothing unless a new signal was posted in between.
    pub fn drain(&self) -> RedrawCause {
        self.rx
            .try_iter()
            .fold(RedrawCause::empty(), |acc, cause| acc | cause)
    }

    /// Wait up to `timeout` for one signal without draining the rest.
    pub fn wait(&self, timeout: Duration) -> Option<RedrawCause> {
        if timeout.is_zero() {
            return self.rx.try_recv().ok();
        }
        self.rx.recv_timeout(timeout).ok()
    }

    /// Whether at least one signal is pending.
    pub fn is_pending(&self) -> bool {
        !self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_leaves_channel_empty() {
        let (tx, rx) = redraw_channel();
        tx.notify(RedrawCause::DATA);
        tx.notify(RedrawCause::DATA);
        tx.notify(RedrawCause::RESIZE);

        assert!(rx.is_pending());
        assert_eq!(rx.drain(), RedrawCause::DATA | RedrawCause::RESIZE);
        assert!(!rx.is_pending());
        assert_eq!(rx.wait(Duration::ZERO), None);
    }

    #[test]
    fn test_signal_after_drain_is_seen() {
        let (tx, rx) = redraw_channel();
        tx.notify(RedrawCause::DATA);
        let _ = rx.drain();

        tx.notify(RedrawCause::RESIZE);
        assert_eq!(rx.wait(Duration::ZERO), Some(RedrawCause::RESIZE));
    }

    #[test]
    fn test_full_channel_coalesces_without_blocking() {
        let (tx, rx) = redraw_channel();
        for _ in 0..REDRAW_SLOTS * 4 {
            tx.notify(RedrawCause::DATA);
        }
        assert_eq!(rx.receiver().len(), REDRAW_SLOTS);
        assert_eq!(rx.drain(), RedrawCause::DATA);
        assert_eq!(rx.wait(Duration::ZERO), None);
    }

    #[test]
    fn test_notify_after_receiver_dropped() {
        let (tx, rx) = redraw_channel();
        drop(rx);
        tx.notify(RedrawCause::DATA);
    }

    #[test]
    fn test_wait_wakes_on_post_from_other_thread() {
        let (tx, rx) = redraw_channel();
        let poster = std::thread::spawn(move || tx.notify(RedrawCause::DATA));
        assert_eq!(rx.wait(Duration::from_secs(5)), Some(RedrawCause::DATA));
        poster.join().unwrap();
    }
}
