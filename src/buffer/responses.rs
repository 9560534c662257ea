//! Shared Response Buffer: fixed-capacity, append-only log of transfers.
//!
//! Slots are write-once. The published `count` is the only synchronization
//! point: the writer fills a slot completely before advancing `count` with
//! release ordering, and readers only look at slots below the `count` they
//! loaded with acquire ordering. No locks are involved.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Default number of responses kept for the lifetime of the process.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Broken buffer invariant. Always fatal to the worker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// Every slot is used; there is nowhere to put another response.
    #[error("response buffer full ({capacity} responses)")]
    Full {
        /// Configured capacity.
        capacity: usize,
    },
    /// A publish did not target the next unpublished slot.
    #[error("slot {slot} published out of order (next free slot is {next})")]
    OutOfOrder {
        /// Slot the caller tried to publish.
        slot: usize,
        /// Slot that had to be published next.
        next: usize,
    },
}

/// How a transfer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The server answered; the body was received in full.
    Completed {
        /// HTTP status code.
        status: u16,
    },
    /// The transfer failed (DNS, connect, timeout, malformed response).
    Failed {
        /// Human readable failure description.
        reason: String,
    },
}

/// The stored result of one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    url: String,
    body: Vec<u8>,
    outcome: Outcome,
}

impl Response {
    /// Create a response record.
    pub const fn new(url: String, body: Vec<u8>, outcome: Outcome) -> Self {
        Self { url, body, outcome }
    }

    /// The URL as submitted.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The received bytes, or `None` if nothing arrived.
    pub fn payload(&self) -> Option<&[u8]> {
        (!self.body.is_empty()).then_some(self.body.as_slice())
    }

    /// Number of payload bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if no payload bytes were received.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// How the transfer ended.
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Whether the transfer failed.
    pub const fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }
}

#[derive(Debug)]
struct Shared {
    slots: Box<[OnceLock<Response>]>,
    count: AtomicUsize,
}

impl Shared {
    fn published(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

/// Allocate a buffer with `capacity` slots, split into its single writer and
/// a cloneable reader.
pub fn response_buffer(capacity: usize) -> (ResponseWriter, ResponseReader) {
    let slots = std::iter::repeat_with(OnceLock::new)
        .take(capacity)
        .collect::<Vec<_>>()
        .into_boxed_slice();
    let shared = Arc::new(Shared {
        slots,
        count: AtomicUsize::new(0),
    });

    (
        ResponseWriter {
            shared: Arc::clone(&shared),
        },
        ResponseReader { shared },
    )
}

/// Index of a reserved, not yet published slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

impl SlotId {
    /// Position in the buffer.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The only handle that can publish responses. Owned by the fetch worker.
#[derive(Debug)]
pub struct ResponseWriter {
    shared: Arc<Shared>,
}

impl ResponseWriter {
    /// Reserve the next free slot for a transfer that is about to start.
    ///
    /// Reserving does not change the published count.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Full`] when no slot is left.
    pub fn reserve(&self) -> Result<SlotId, BufferError> {
        let next = self.shared.count.load(Ordering::Relaxed);
        if next >= self.shared.slots.len() {
            return Err(BufferError::Full {
                capacity: self.shared.slots.len(),
            });
        }
        Ok(SlotId(next))
    }

    /// Store `response` in `slot` and make it visible to readers.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfOrder`] if `slot` is not the next
    /// unpublished slot.
    pub fn publish(&self, slot: SlotId, response: Response) -> Result<usize, BufferError> {
        let next = self.shared.count.load(Ordering::Relaxed);
        let out_of_order = BufferError::OutOfOrder { slot: slot.0, next };
        if slot.0 != next {
            return Err(out_of_order);
        }

        let cell = self.shared.slots.get(next).ok_or(BufferError::Full {
            capacity: self.shared.slots.len(),
        })?;
        cell.set(response).map_err(|_| out_of_order)?;

        let count = next + 1;
        self.shared.count.store(count, Ordering::Release);
        Ok(count)
    }

}

/// Read-only view of the published prefix. Held by the foreground.
#[derive(Debug, Clone)]
pub struct ResponseReader {
    shared: Arc<Shared>,
}

impl ResponseReader {
    /// Number of published responses.
    pub fn len(&self) -> usize {
        self.shared.published()
    }

    /// Check if nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }

    /// The response in slot `index`, if it has been published.
    pub fn get(&self, index: usize) -> Option<&Response> {
        if index >= self.len() {
            return None;
        }
        self.shared.slots.get(index).and_then(OnceLock::get)
    }

    /// Published responses, most recent first, as of this call.
    pub fn newest_first(&self) -> impl Iterator<Item = &Response> + '_ {
        let published = self.len();
        self.shared.slots[..published]
            .iter()
            .rev()
            .filter_map(OnceLock::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(url: &str, body: &str) -> Response {
        Response::new(
            url.to_string(),
            body.as_bytes().to_vec(),
            Outcome::Completed { status: 200 },
        )
    }

    #[test]
    fn test_reserve_does_not_publish() {
        let (writer, reader) = response_buffer(4);
        let slot = writer.reserve().unwrap();
        assert_eq!(slot.index(), 0);
        assert_eq!(reader.len(), 0);
        assert!(reader.get(0).is_none());

        assert_eq!(writer.publish(slot, ok("http://a/", "a")), Ok(1));
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.get(0).map(Response::url), Some("http://a/"));
    }

    #[test]
    fn test_newest_first_order() {
        let (writer, reader) = response_buffer(8);
        for url in ["http://1/", "http://2/", "http://3/"] {
            let slot = writer.reserve().unwrap();
            writer.publish(slot, ok(url, "x")).unwrap();
        }
        let urls: Vec<_> = reader.newest_first().map(Response::url).collect();
        assert_eq!(urls, ["http://3/", "http://2/", "http://1/"]);
    }

    #[test]
    fn test_capacity_exhaustion_is_an_error() {
        let (writer, reader) = response_buffer(2);
        for _ in 0..2 {
            let slot = writer.reserve().unwrap();
            writer.publish(slot, ok("http://x/", "x")).unwrap();
        }
        assert_eq!(writer.reserve(), Err(BufferError::Full { capacity: 2 }));
        assert_eq!(reader.len(), reader.capacity());
    }

    #[test]
    fn test_stale_slot_is_rejected() {
        let (writer, reader) = response_buffer(4);
        let slot = writer.reserve().unwrap();
        writer.publish(slot, ok("http://a/", "a")).unwrap();

        assert_eq!(
            writer.publish(slot, ok("http://b/", "b")),
            Err(BufferError::OutOfOrder { slot: 0, next: 1 })
        );
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.get(0).map(Response::url), Some("http://a/"));
    }

    #[test]
    fn test_empty_body_has_no_payload() {
        let failed = Response::new(
            "http://nowhere/".to_string(),
            Vec::new(),
            Outcome::Failed {
                reason: "dns".to_string(),
            },
        );
        assert!(failed.payload().is_none());
        assert!(failed.is_failed());
        assert!(failed.is_empty());

        let full = ok("http://a/", "abc");
        assert_eq!(full.payload(), Some(&b"abc"[..]));
        assert_eq!(full.len(), 3);
    }

    #[test]
    fn test_reader_sees_writes_from_other_thread() {
        let (writer, reader) = response_buffer(DEFAULT_CAPACITY);
        let worker = std::thread::spawn(move || {
            for i in 0..100 {
                let slot = writer.reserve().unwrap();
                writer
                    .publish(slot, ok(&format!("http://{i}/"), "body"))
                    .unwrap();
            }
        });
        worker.join().unwrap();

        assert_eq!(reader.len(), 100);
        for (i, response) in reader.newest_first().enumerate() {
            assert_eq!(response.url(), format!("http://{}/", 99 - i));
        }
    }
}
