//! Full-frame composition.

use super::input_line::InputLine;
use super::response_view::ResponseView;
use super::traits::Widget;
use crate::layout::Rect;
use crate::terminal::OutputBuffer;

/// Draw one complete frame of `cols` x `rows` into `out`.
///
/// The previous contents of `out` are discarded. The frame clears the whole
/// screen, fills every row but the last with the response view, and puts the
/// input line on the last row, leaving the cursor at the end of the typed
/// text.
pub fn draw_frame(
    out: &mut OutputBuffer,
    (cols, rows): (u16, u16),
    view: &ResponseView,
    input: &InputLine,
) {
    out.clear();
    out.clear_screen();

    let (body, prompt) = Rect::from_size(cols, rows).split_bottom(1);
    view.render(body, out);
    input.render(prompt, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Keystroke;
    use crate::buffer::{response_buffer, Outcome, Response};
    use crate::widget::InputLineConfig;
    use pretty_assertions::assert_eq;

    fn emulate(out: &OutputBuffer, cols: u16, rows: u16) -> vt100::Parser {
        let mut parser = vt100::Parser::new(rows, cols, 0);
        parser.process(out.as_bytes());
        parser
    }

    #[test]
    fn test_frame_layout() {
        let (writer, reader) = response_buffer(4);
        let slot = writer.reserve().unwrap();
        writer
            .publish(
                slot,
                Response::new(
                    "http://a/".to_string(),
                    b"line one\nline two\n".to_vec(),
                    Outcome::Completed { status: 200 },
                ),
            )
            .unwrap();

        let view = ResponseView::new(reader);
        let mut input = InputLine::new(InputLineConfig::default());
        for c in "http://b/".chars() {
            input.handle_key(Keystroke::Char(c));
        }

        let mut out = OutputBuffer::new();
        draw_frame(&mut out, (20, 4), &view, &input);

        let parser = emulate(&out, 20, 4);
        let rows: Vec<String> = parser
            .screen()
            .rows(0, 20)
            .map(|row| row.trim_end().to_string())
            .collect();
        assert_eq!(rows, ["", "line one", "line two", "http://b/"]);
        assert_eq!(parser.screen().cursor_position(), (3, 9));
    }

    #[test]
    fn test_frame_replaces_previous_output() {
        let (_writer, reader) = response_buffer(4);
        let view = ResponseView::new(reader);
        let input = InputLine::default();

        let mut out = OutputBuffer::new();
        out.write_str("stale");
        draw_frame(&mut out, (10, 2), &view, &input);

        assert!(out.as_bytes().starts_with(b"\x1b[H\x1b[2J"));
        assert_eq!(emulate(&out, 10, 2).screen().contents(), "");
    }

    #[test]
    fn test_single_row_terminal_shows_only_prompt() {
        let (writer, reader) = response_buffer(4);
        let slot = writer.reserve().unwrap();
        writer
            .publish(
                slot,
                Response::new(
                    "http://a/".to_string(),
                    b"hidden\n".to_vec(),
                    Outcome::Completed { status: 200 },
                ),
            )
            .unwrap();

        let view = ResponseView::new(reader);
        let mut input = InputLine::default();
        input.handle_key(Keystroke::Char('x'));

        let mut out = OutputBuffer::new();
        draw_frame(&mut out, (10, 1), &view, &input);
        assert_eq!(emulate(&out, 10, 1).screen().contents(), "x");
    }
}
