//! Rect: A rectangle primitive for screen areas.

/// A rectangle defined by position and size, in terminal cells.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate (column) of the top-left corner.
    pub x: u16,
    /// Y coordinate (row) of the top-left corner.
    pub y: u16,
    /// Width in columns.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
}

impl Rect {
    /// Zero-sized rectangle.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Create a rectangle from a terminal size (full screen).
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Check if the rectangle is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Split vertically at a given row offset.
    pub fn split_vertical(&self, at: u16) -> (Self, Self) {
        let at = at.min(self.height);
        (
            Self::new(self.x, self.y, self.width, at),
            Self::new(self.x, self.y + at, self.width, self.height - at),
        )
    }

    /// Split off the last `rows` rows, returning `(top, bottom)`.
    pub fn split_bottom(&self, rows: u16) -> (Self, Self) {
        self.split_vertical(self.height.saturating_sub(rows))
    }
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rect({}, {} {}x{})", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_bottom_reserves_input_row() {
        let screen = Rect::from_size(80, 24);
        let (content, prompt) = screen.split_bottom(1);
        assert_eq!(content, Rect::new(0, 0, 80, 23));
        assert_eq!(prompt, Rect::new(0, 23, 80, 1));
    }

    #[test]
    fn test_split_bottom_single_row_screen() {
        let (content, prompt) = Rect::from_size(10, 1).split_bottom(1);
        assert!(content.is_empty());
        assert_eq!(prompt, Rect::new(0, 0, 10, 1));
    }

    #[test]
    fn test_split_vertical_clamps() {
        let (top, bottom) = Rect::new(2, 3, 5, 4).split_vertical(10);
        assert_eq!(top, Rect::new(2, 3, 5, 4));
        assert_eq!(bottom, Rect::new(2, 7, 5, 0));
        assert!(Rect::ZERO.is_empty());
    }
}
