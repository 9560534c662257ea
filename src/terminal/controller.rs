//! Terminal Controller: raw mode, alternate screen, and restoration.
//!
//! The controller captures the terminal's current mode when entering raw
//! mode and puts it back on `exit()` or drop. Restoration is also reachable
//! from the panic hook and from [`fatal`], so every exit path leaves the
//! user's shell usable.

use crossterm::{
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::fmt::Display;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// xterm window title stack: push on entry, pop on exit.
const TITLE_PUSH: &[u8] = b"\x1b[22;0;0t";
const TITLE_POP: &[u8] = b"\x1b[23;0;0t";

/// Set while raw mode is active for this process.
static RAW_ACTIVE: AtomicBool = AtomicBool::new(false);
/// Set while the alternate screen is shown.
static ALT_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Terminal setup or teardown failure.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Switching into raw mode failed.
    #[error("failed to enable raw mode")]
    RawMode(#[source] io::Error),
    /// Writing the alternate-screen sequences failed.
    #[error("failed to switch screen buffer")]
    Screen(#[source] io::Error),
    /// Restoring the original mode failed.
    #[error("failed to restore terminal mode")]
    Restore(#[source] io::Error),
}

/// Owns the terminal mode for the lifetime of the foreground loop.
#[derive(Debug)]
pub struct TerminalController {
    /// Whether this controller still has to restore the terminal.
    active: bool,
    /// Whether `enter()` switched to the alternate screen.
    alternate_screen: bool,
}

impl TerminalController {
    /// Capture the current mode, switch to raw character-at-a-time input
    /// without echo, and optionally move to the alternate screen.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be enabled or the screen switch
    /// cannot be written. Raw mode is rolled back if the screen switch fails.
    pub fn enter(alternate_screen: bool) -> Result<Self, TerminalError> {
        terminal::enable_raw_mode().map_err(TerminalError::RawMode)?;
        RAW_ACTIVE.store(true, Ordering::SeqCst);

        if alternate_screen {
            let mut stdout = io::stdout();
            let switched = execute!(stdout, EnterAlternateScreen)
                .and_then(|()| stdout.write_all(TITLE_PUSH))
                .and_then(|()| stdout.flush());
            if let Err(e) = switched {
                restore_best_effort();
                return Err(TerminalError::Screen(e));
            }
            ALT_ACTIVE.store(true, Ordering::SeqCst);
        }

        tracing::debug!(alternate_screen, "terminal entered raw mode");

        Ok(Self {
            active: true,
            alternate_screen,
        })
    }

    /// Restore the captured mode and return to the primary screen.
    ///
    /// Calling this more than once is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if either step fails; both are always attempted.
    pub fn exit(&mut self) -> Result<(), TerminalError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let raw = if RAW_ACTIVE.swap(false, Ordering::SeqCst) {
            terminal::disable_raw_mode()
        } else {
            Ok(())
        };

        let screen = if self.alternate_screen && ALT_ACTIVE.swap(false, Ordering::SeqCst) {
            leave_alternate_screen()
        } else {
            Ok(())
        };

        tracing::debug!("terminal restored");
        raw.and(screen).map_err(TerminalError::Restore)
    }

    /// Query the current window size as `(columns, rows)`.
    ///
    /// Returns `None` when the size cannot be determined or is reported as
    /// zero; callers fall back to the last known size.
    pub fn window_size() -> Option<(u16, u16)> {
        match terminal::size() {
            Ok((cols, rows)) if cols > 0 && rows > 0 => Some((cols, rows)),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "window size query failed");
                None
            }
        }
    }
}

impl Drop for TerminalController {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}

fn leave_alternate_screen() -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(TITLE_POP)?;
    execute!(stdout, LeaveAlternateScreen)
}

/// Undo whatever terminal mode changes are still in effect, ignoring errors.
///
/// Safe to call from any thread and any number of times.
pub fn restore_best_effort() {
    if RAW_ACTIVE.swap(false, Ordering::SeqCst) {
        let _ = terminal::disable_raw_mode();
    }
    if ALT_ACTIVE.swap(false, Ordering::SeqCst) {
        let _ = leave_alternate_screen();
    }
}

/// Install a panic hook that restores the terminal before the previous hook
/// prints the panic message.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_best_effort();
        previous(info);
    }));
}

/// Terminate the process on a broken invariant.
///
/// The terminal is restored first so the diagnostic is readable.
pub fn fatal(error: &dyn Display) -> ! {
    restore_best_effort();
    tracing::error!(%error, "fatal error, aborting");
    eprintln!("fetchpane: fatal: {error}");
    std::process::abort()
}
