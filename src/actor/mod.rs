//! Actor Model: the threads of the client and how they talk.
//!
//! - **Fetch Worker**: performs one HTTP transfer at a time, publishes the
//!   result and posts a redraw signal
//! - **Input Actor**: blocks on terminal events, forwards keystrokes and turns
//!   resizes into redraw signals
//! - **Engine**: the foreground loop; renders and reacts to whichever channel
//!   fires first
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐      InputEvent      ┌──────────────┐
//! │ Input Thread │ ───────────────────▶ │              │
//! └──────────────┘                      │              │
//!        │ RESIZE                       │    Engine    │
//!        ▼                              │ (foreground) │
//!   redraw channel ───────────────────▶ │              │
//!        ▲                              └──────────────┘
//!        │ DATA                                │ PendingRequest
//! ┌──────────────┐                             │
//! │ Fetch Worker │ ◀───────────────────────────┘
//! └──────────────┘
//! ```

mod engine;
mod input;
mod messages;
mod worker;

pub use engine::{Engine, EngineConfig, EngineError};
pub use input::InputActor;
pub use messages::{InputEvent, Keystroke};
pub use worker::{FetchWorker, WorkerError, WorkerHandle, WorkerPhase, DEFAULT_LIVENESS_TIMEOUT};
