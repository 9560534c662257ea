//! Terminal access: mode control and frame output.

mod controller;
mod output;

pub use controller::{
    fatal, install_panic_hook, restore_best_effort, TerminalController, TerminalError,
};
pub use output::OutputBuffer;
