//! Inter-thread conduits between the foreground loop and the fetch worker.
//!
//! ```text
//!                 RequestSender ──▶ RequestReceiver
//! ┌────────────┐                                    ┌──────────────┐
//! │ Foreground │ ── ShutdownSignal (done + wake) ─▶ │ Fetch Worker │
//! └────────────┘                                    └──────────────┘
//!                 RedrawReceiver ◀── RedrawSender
//!                        ▲
//!                        └────────── resize (input actor)
//! ```

mod redraw;
mod request;
mod shutdown;

pub use redraw::{redraw_channel, RedrawCause, RedrawReceiver, RedrawSender};
pub use request::{request_channel, ChannelError, PendingRequest, RequestReceiver, RequestSender};
pub use shutdown::ShutdownSignal;
