//! Response View Widget: the scrollable log of fetched bodies.
//!
//! The view is filled bottom-up. Starting at the last row of its area it
//! walks the published responses from newest to oldest, and each response's
//! lines from last to first, until the top of the area is reached.
//!
//! ```text
//!   row 0        ┐
//!   ...          │ older lines
//!   row h-2      │
//!   row h-1      ┘ last line of the newest response (scroll offset 0)
//! ```
//!
//! A positive scroll offset skips that many lines at the bottom, revealing
//! older content. Failed transfers contribute nothing.

use super::clip::write_clipped;
use super::traits::Widget;
use crate::buffer::ResponseReader;
use crate::layout::Rect;
use crate::terminal::OutputBuffer;

/// Scrollable view over the shared response buffer.
#[derive(Debug)]
pub struct ResponseView {
    responses: ResponseReader,
    /// Lines skipped from the bottom. Negative values skip nothing.
    scroll: i32,
}

impl ResponseView {
    /// Create a view scrolled to the newest line.
    pub const fn new(responses: ResponseReader) -> Self {
        Self {
            responses,
            scroll: 0,
        }
    }

    /// Current scroll offset.
    pub const fn scroll(&self) -> i32 {
        self.scroll
    }

    /// Adjust the scroll offset by `delta` lines.
    pub fn scroll_by(&mut self, delta: i32) {
        self.scroll = self.scroll.saturating_add(delta);
    }

    /// The buffer being shown.
    pub const fn responses(&self) -> &ResponseReader {
        &self.responses
    }
}

/// Split a payload into display lines.
///
/// A trailing newline ends the last line rather than starting an empty one.
fn payload_lines(payload: &[u8]) -> impl DoubleEndedIterator<Item = &[u8]> {
    let body = payload.strip_suffix(b"\n").unwrap_or(payload);
    body.split(|&b| b == b'\n')
}

impl Widget for ResponseView {
    fn render(&self, area: Rect, out: &mut OutputBuffer) {
        if area.is_empty() {
            return;
        }

        let mut rows_left = area.height;
        let mut skip = usize::try_from(self.scroll).unwrap_or(0);

        'responses: for response in self.responses.newest_first() {
            let Some(payload) = response.payload() else {
                continue;
            };

            for line in payload_lines(payload).rev() {
                if rows_left == 0 {
                    break 'responses;
                }
                if skip > 0 {
                    skip -= 1;
                    continue;
                }

                rows_left -= 1;
                out.cursor_move(area.x, area.y + rows_left);
                write_clipped(out, &String::from_utf8_lossy(line), area.width);
            }
        }
    }
}
