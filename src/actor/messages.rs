//! Message types for actor communication.
//!
//! These enums define the protocol between the input actor and the
//! foreground loop.

/// A keystroke the foreground loop reacts to.
///
/// This is the subset of crossterm's key events that matters for a
/// single-line URL prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keystroke {
    /// Ctrl+C: end the session.
    Interrupt,
    /// Enter/Return: submit the input line.
    Enter,
    /// Backspace (or Ctrl+H): remove the last character.
    Backspace,
    /// Show older lines (Up, Page Up).
    ScrollBack,
    /// Show newer lines (Down, Page Down).
    ScrollForward,
    /// A printable character.
    Char(char),
}

/// Events from the input thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key was pressed.
    Key(Keystroke),
    /// Reading the terminal failed. The input thread has stopped.
    Error(String),
}
