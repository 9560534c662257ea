//! Input Line Widget: the single-line URL prompt on the last row.
//!
//! Characters are only ever appended at the end and removed from the end,
//! so there is no cursor to track. The line holds at most `limit`
//! characters; anything typed beyond that is dropped.

use super::clip::write_clipped;
use super::traits::Widget;
use crate::actor::Keystroke;
use crate::layout::Rect;
use crate::terminal::OutputBuffer;

/// Default maximum number of characters in the input line.
pub const DEFAULT_INPUT_LIMIT: usize = 127;

/// What the foreground should do after a keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction {
    /// Nothing beyond a redraw.
    None,
    /// Hand this URL to the fetch worker.
    Submit(String),
    /// Adjust the scroll offset by this many lines.
    Scroll(i32),
    /// End the session.
    Quit,
}

/// Configuration for the input line.
#[derive(Debug, Clone)]
pub struct InputLineConfig {
    /// Maximum number of characters.
    pub limit: usize,
    /// Character that shows older lines instead of being typed.
    pub scroll_back: char,
    /// Character that shows newer lines instead of being typed.
    pub scroll_forward: char,
}

impl Default for InputLineConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_INPUT_LIMIT,
            scroll_back: '\'',
            scroll_forward: '"',
        }
    }
}

/// The prompt's editable text.
#[derive(Debug, Default)]
pub struct InputLine {
    /// Current text content.
    content: String,
    /// Number of characters in `content`.
    chars: usize,
    config: InputLineConfig,
}

impl InputLine {
    /// Create an empty input line.
    pub fn new(config: InputLineConfig) -> Self {
        Self {
            content: String::new(),
            chars: 0,
            config,
        }
    }

    /// Get the current text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Check if nothing has been typed.
    pub const fn is_empty(&self) -> bool {
        self.chars == 0
    }

    /// Whether the line has reached its character limit.
    pub const fn is_full(&self) -> bool {
        self.chars >= self.config.limit
    }

    /// Apply one keystroke.
    pub fn handle_key(&mut self, key: Keystroke) -> LineAction {
        match key {
            Keystroke::Interrupt => LineAction::Quit,
            Keystroke::Enter => {
                self.chars = 0;
                LineAction::Submit(std::mem::take(&mut self.content))
            }
            Keystroke::Backspace => {
                if self.content.pop().is_some() {
                    self.chars -= 1;
                }
                LineAction::None
            }
            Keystroke::ScrollBack => LineAction::Scroll(1),
            Keystroke::ScrollForward => LineAction::Scroll(-1),
            Keystroke::Char(c) if c == self.config.scroll_back => LineAction::Scroll(1),
            Keystroke::Char(c) if c == self.config.scroll_forward => LineAction::Scroll(-1),
            Keystroke::Char(c) => {
                self.push(c);
                LineAction::None
            }
        }
    }

    /// Append a printable character if there is room.
    fn push(&mut self, c: char) {
        if c.is_control() || self.is_full() {
            return;
        }
        self.content.push(c);
        self.chars += 1;
    }
}

impl Widget for InputLine {
    fn render(&self, area: Rect, out: &mut OutputBuffer) {
        if area.is_empty() {
            return;
        }
        out.cursor_move(area.x, area.y);
        write_clipped(out, &self.content, area.width);
    }
}
