//! Input Actor: Dedicated thread for reading terminal events.
//!
//! This actor blocks in crossterm's event reader so the foreground loop can
//! wait on a channel instead of the raw stdin descriptor. Keystrokes are
//! forwarded to the foreground; resize events are injected into the redraw
//! channel so the foreground treats them exactly like new data.

use super::messages::{InputEvent, Keystroke};
use crate::channel::{RedrawCause, RedrawSender};
use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::thread::{self, JoinHandle};

/// What a terminal event turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Translated {
    Key(Keystroke),
    Redraw(RedrawCause),
}

/// Input actor that reads terminal events.
#[derive(Debug)]
pub struct InputActor {
    /// Handle to the input thread.
    handle: Option<JoinHandle<()>>,
}

impl InputActor {
    /// Spawn the input actor thread.
    ///
    /// The thread stops on its own after forwarding [`Keystroke::Interrupt`],
    /// when the foreground drops its receiver, or when reading fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS fails to spawn the thread.
    pub fn spawn(sender: Sender<InputEvent>, redraw: RedrawSender) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name("fetchpane-input".to_string())
            .spawn(move || Self::run_loop(&sender, &redraw))?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the input thread if it has already stopped.
    ///
    /// A thread still blocked in a terminal read is detached instead; it
    /// ends with the process.
    pub fn join(mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.is_finished() {
            let _ = handle.join();
        } else {
            tracing::debug!("input thread still blocked in read, detaching");
        }
    }

    /// Main input loop.
    fn run_loop(sender: &Sender<InputEvent>, redraw: &RedrawSender) {
        loop {
            let event = match event::read() {
                Ok(event) => event,
                Err(e) => {
                    let _ = sender.send(InputEvent::Error(e.to_string()));
                    break;
                }
            };

            match Self::convert_event(event) {
                Some(Translated::Key(key)) => {
                    if sender.send(InputEvent::Key(key)).is_err() {
                        // Receiver dropped, exit
                        break;
                    }
                    if key == Keystroke::Interrupt {
                        break;
                    }
                }
                Some(Translated::Redraw(cause)) => redraw.notify(cause),
                None => {}
            }
        }
    }

    /// Convert a crossterm event into a keystroke or a redraw request.
    fn convert_event(event: Event) -> Option<Translated> {
        match event {
            Event::Key(key_event) => Self::convert_key(key_event).map(Translated::Key),
            Event::Resize(_, _) => Some(Translated::Redraw(RedrawCause::RESIZE)),
            _ => None,
        }
    }

    /// Convert a crossterm key event to a keystroke.
    fn convert_key(key: KeyEvent) -> Option<Keystroke> {
        // Only process key press events (not release or repeat)
        if key.kind != KeyEventKind::Press {
            return None;
        }

        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        Some(match key.code {
            KeyCode::Char('c') if control => Keystroke::Interrupt,
            KeyCode::Char('h') if control => Keystroke::Backspace,
            KeyCode::Char(c) if !control && !alt => Keystroke::Char(c),
            KeyCode::Enter => Keystroke::Enter,
            KeyCode::Backspace => Keystroke::Backspace,
            KeyCode::Up | KeyCode::PageUp => Keystroke::ScrollBack,
            KeyCode::Down | KeyCode::PageDown => Keystroke::ScrollForward,
            _ => return None, // Ignore other key codes
        })
    }
}
