//! Widgets: the two screen components and the frame that composes them.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ ResponseView                 │  rows 0 .. h-1, newest line at the bottom
//! │                              │
//! ├──────────────────────────────┤
//! │ InputLine                    │  row h-1
//! └──────────────────────────────┘
//! ```
//!
//! Every frame is drawn from scratch with [`draw_frame`]; widgets keep no
//! knowledge of what is already on screen.

mod clip;
mod frame;
mod input_line;
mod response_view;
mod traits;

pub use clip::write_clipped;
pub use frame::draw_frame;
pub use input_line::{InputLine, InputLineConfig, LineAction, DEFAULT_INPUT_LIMIT};
pub use response_view::ResponseView;
pub use traits::Widget;
