//! Layout module: screen geometry.
//!
//! The screen is recomputed from the terminal size on every frame, so there is
//! no cached layout to invalidate on resize.

mod rect;

pub use rect::Rect;
