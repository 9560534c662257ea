//! Width-limited text output shared by the widgets.

use crate::terminal::OutputBuffer;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Write `text` clipped to `width` display columns.
///
/// Tabs become a single space and every other control character is dropped,
/// so fetched content cannot move the cursor or inject escape sequences. A
/// wide grapheme that would straddle the edge is left out.
///
/// Returns the number of columns used.
pub fn write_clipped(out: &mut OutputBuffer, text: &str, width: u16) -> u16 {
    let limit = usize::from(width);
    let mut used = 0usize;

    for grapheme in text.graphemes(true) {
        let shown: String = grapheme
            .chars()
            .filter_map(|c| match c {
                '\t' => Some(' '),
                c if c.is_control() => None,
                c => Some(c),
            })
            .collect();
        if shown.is_empty() {
            continue;
        }

        let cols = shown.width();
        if used + cols > limit {
            break;
        }
        out.write_str(&shown);
        used += cols;
    }

    // `used` never exceeds `limit`, which came from a u16.
    u16::try_from(used).unwrap_or(width)
}
