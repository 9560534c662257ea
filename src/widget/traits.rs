//! Widget trait.

use crate::layout::Rect;
use crate::terminal::OutputBuffer;

/// A UI component that draws itself into a screen area.
///
/// Widgets are redrawn from scratch on every frame, so rendering must only
/// depend on the widget's current state and the area it is given.
pub trait Widget {
    /// Render this widget into `area`.
    ///
    /// The widget should only write to cells within `area`.
    fn render(&self, area: Rect, out: &mut OutputBuffer);
}
