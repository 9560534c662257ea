//! # fetchpane
//!
//! An interactive terminal HTTP viewer that stays responsive while it fetches.
//!
//! Type a URL on the bottom line and press Enter. A background worker fetches
//! it while the foreground keeps accepting keystrokes; when the transfer ends
//! the body is appended to the scrollable view above the prompt.
//!
//! ## Core Concepts
//!
//! - **Two threads of work**: a foreground input/render loop and one fetch
//!   worker, plus a thin input thread that reads terminal events
//! - **Channels only**: a request channel, a payload-free redraw channel and a
//!   shutdown signal are the only links between them
//! - **Append-only responses**: the worker publishes into fixed slots and
//!   advances one atomic count; the foreground reads the published prefix
//! - **Full redraws**: every wake redraws the whole frame in one write
//!
//! ## Example
//!
//! ```rust,ignore
//! use fetchpane::{Engine, EngineConfig};
//!
//! let mut engine = Engine::with_config(EngineConfig::default())?;
//! engine.submit("https://example.com/")?;
//! engine.run()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod buffer;
pub mod channel;
pub mod layout;
pub mod logging;
pub mod terminal;
pub mod transport;
pub mod widget;

// Re-exports for convenience
pub use actor::{Engine, EngineConfig, EngineError, InputEvent, Keystroke};
pub use buffer::{Outcome, Response, ResponseReader};
pub use layout::Rect;
pub use transport::{HttpConfig, HttpTransport, Transport};
pub use widget::{InputLine, ResponseView, Widget};
