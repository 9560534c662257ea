//! Buffer module: the shared log of completed transfers.
//!
//! - `ResponseWriter`: publishes results, owned by the fetch worker
//! - `ResponseReader`: reads the published prefix, owned by the foreground

mod responses;

pub use responses::{
    response_buffer, BufferError, Outcome, Response, ResponseReader, ResponseWriter, SlotId,
    DEFAULT_CAPACITY,
};
