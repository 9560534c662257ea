//! Engine: the foreground input/render loop and the process lifecycle.
//!
//! The Engine owns the terminal and every piece of foreground state. It
//! spawns the fetch worker and the input actor, then alternates between
//! drawing a full frame and blocking in one multiplexed wait over the
//! keystroke channel and the redraw channel.

use super::input::InputActor;
use super::messages::{InputEvent, Keystroke};
use super::worker::{FetchWorker, WorkerError, WorkerHandle, DEFAULT_LIVENESS_TIMEOUT};
use crate::buffer::{response_buffer, ResponseReader, DEFAULT_CAPACITY};
use crate::channel::{
    redraw_channel, request_channel, ChannelError, RedrawReceiver, RequestSender, ShutdownSignal,
};
use crate::terminal::{OutputBuffer, TerminalController, TerminalError};
use crate::transport::{HttpConfig, HttpTransport, TransferError};
use crate::widget::{draw_frame, InputLine, InputLineConfig, LineAction, ResponseView};
use crossbeam_channel::{bounded, Receiver};
use std::io::{self, Write};
use std::time::Duration;
use thiserror::Error;

/// Keystrokes buffered between the input thread and the foreground.
const INPUT_QUEUE_DEPTH: usize = 64;

/// Configuration for the Engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of response slots. Exhausting them is fatal.
    pub capacity: usize,
    /// Input line limit and scroll characters.
    pub input: InputLineConfig,
    /// Upper bound on any single wait of the fetch worker.
    pub liveness_timeout: Duration,
    /// Whether to use alternate screen buffer.
    pub alternate_screen: bool,
    /// Window size used until the terminal reports one, as `(cols, rows)`.
    pub fallback_size: (u16, u16),
    /// HTTP client settings.
    pub http: HttpConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            input: InputLineConfig::default(),
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
            alternate_screen: true,
            fallback_size: (80, 24),
            http: HttpConfig::default(),
        }
    }
}

/// Engine failures.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Raw mode or the alternate screen could not be set up or restored.
    #[error(transparent)]
    Terminal(#[from] TerminalError),
    /// The HTTP client could not be created.
    #[error("failed to initialise the HTTP client")]
    Transport(#[source] TransferError),
    /// The worker or input thread could not be spawned.
    #[error("failed to spawn a background thread")]
    Spawn(#[source] io::Error),
    /// A request could not be handed to the worker.
    #[error(transparent)]
    Channel(#[from] ChannelError),
    /// Writing a frame to the terminal failed.
    #[error("failed to draw to the terminal")]
    Render(#[source] io::Error),
    /// The input thread could not read the terminal.
    #[error("terminal input failed: {0}")]
    Input(String),
    /// The input thread went away without reporting an error.
    #[error("input thread stopped unexpectedly")]
    InputClosed,
    /// Every redraw sender is gone while the loop is still running.
    #[error("redraw channel closed unexpectedly")]
    RedrawClosed,
    /// The fetch worker did not stop cleanly.
    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Whether the loop keeps going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Foreground-owned state: input line, scroll offset and the frame buffer.
///
/// Kept apart from the terminal and threads so it can be driven directly.
#[derive(Debug)]
struct Foreground {
    requests: RequestSender,
    view: ResponseView,
    line: InputLine,
    out: OutputBuffer,
    /// Last window size that was successfully used.
    size: (u16, u16),
}

impl Foreground {
    fn new(requests: RequestSender, responses: ResponseReader, config: &EngineConfig) -> Self {
        Self {
            requests,
            view: ResponseView::new(responses),
            line: InputLine::new(config.input.clone()),
            out: OutputBuffer::new(),
            size: config.fallback_size,
        }
    }

    fn submit(&mut self, url: String) -> Result<u64, ChannelError> {
        self.requests.send(url)
    }

    fn handle_key(&mut self, key: Keystroke) -> Result<Flow, ChannelError> {
        match self.line.handle_key(key) {
            LineAction::None => {}
            LineAction::Submit(url) => {
                self.submit(url)?;
            }
            LineAction::Scroll(delta) => self.view.scroll_by(delta),
            LineAction::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Draw a frame for `size`, or for the last known size if `None`.
    fn frame(&mut self, size: Option<(u16, u16)>) -> &OutputBuffer {
        if let Some(size) = size {
            self.size = size;
        }
        draw_frame(&mut self.out, self.size, &self.view, &self.line);
        &self.out
    }

    /// One loop iteration: draw a frame into `sink`, then block until a
    /// keystroke or a redraw signal arrives and act on it.
    fn step<W: Write>(
        &mut self,
        input: &Receiver<InputEvent>,
        redraw: &RedrawReceiver,
        size: Option<(u16, u16)>,
        sink: &mut W,
    ) -> Result<Flow, EngineError> {
        self.frame(size).flush_to(sink).map_err(EngineError::Render)?;

        crossbeam_channel::select! {
            recv(input) -> event => match event {
                Ok(InputEvent::Key(key)) => Ok(self.handle_key(key)?),
                Ok(InputEvent::Error(e)) => Err(EngineError::Input(e)),
                Err(_) => Err(EngineError::InputClosed),
            },
            recv(redraw.receiver()) -> cause => {
                let cause = cause.map_err(|_| EngineError::RedrawClosed)?;
                // Drain so a burst of signals costs one frame.
                let cause = cause | redraw.drain();
                tracing::trace!(?cause, "redraw");
                Ok(Flow::Continue)
            }
        }
    }
}

/// The fetchpane engine.
///
/// Construction performs the whole startup sequence; [`run`](Self::run)
/// drives the loop and performs the shutdown sequence when it ends.
pub struct Engine {
    foreground: Foreground,
    terminal: TerminalController,
    redraw: RedrawReceiver,
    shutdown: ShutdownSignal,
    /// Fetch worker handle, taken on shutdown.
    worker: Option<WorkerHandle>,
    /// Input event receiver.
    input_rx: Receiver<InputEvent>,
    /// Input actor handle, taken on shutdown.
    input_actor: Option<InputActor>,
}

impl Engine {
    /// Start the HTTP client, the channels and the fetch worker, then take
    /// over the terminal and start reading input.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built, a thread cannot
    /// be spawned, or the terminal cannot be switched to raw mode. The worker
    /// is stopped again if a later step fails.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        let transport = HttpTransport::new(&config.http).map_err(EngineError::Transport)?;

        let (requests, request_rx) = request_channel();
        let (redraw_tx, redraw) = redraw_channel();
        let (writer, responses) = response_buffer(config.capacity);
        let shutdown = ShutdownSignal::new();

        let worker = FetchWorker::new(
            transport,
            request_rx,
            writer,
            redraw_tx.clone(),
            shutdown.clone(),
            config.liveness_timeout,
        )
        .spawn()
        .map_err(EngineError::Spawn)?;

        let terminal = match TerminalController::enter(config.alternate_screen) {
            Ok(terminal) => terminal,
            Err(e) => {
                stop_worker(&shutdown, worker);
                return Err(e.into());
            }
        };

        let (input_tx, input_rx) = bounded::<InputEvent>(INPUT_QUEUE_DEPTH);
        let input_actor = match InputActor::spawn(input_tx, redraw_tx) {
            Ok(actor) => actor,
            Err(e) => {
                drop(terminal);
                stop_worker(&shutdown, worker);
                return Err(EngineError::Spawn(e));
            }
        };

        tracing::info!(
            capacity = config.capacity,
            alternate_screen = config.alternate_screen,
            "engine started"
        );

        Ok(Self {
            foreground: Foreground::new(requests, responses, &config),
            terminal,
            redraw,
            shutdown,
            worker: Some(worker),
            input_rx,
            input_actor: Some(input_actor),
        })
    }

    /// Queue `url` for fetching as if it had been typed and submitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker is no longer receiving requests.
    pub fn submit(&mut self, url: impl Into<String>) -> Result<u64, EngineError> {
        Ok(self.foreground.submit(url.into())?)
    }

    /// Run the loop until Ctrl+C, then shut down.
    ///
    /// # Errors
    ///
    /// Returns the first error from the loop, or from shutdown if the loop
    /// ended cleanly.
    pub fn run(mut self) -> Result<(), EngineError> {
        let result = self.event_loop();
        if let Err(e) = &result {
            tracing::error!(error = %e, "event loop failed");
        }
        let stopped = self.shutdown();
        result.and(stopped)
    }

    fn event_loop(&mut self) -> Result<(), EngineError> {
        let mut stdout = io::stdout();
        loop {
            let flow = self.foreground.step(
                &self.input_rx,
                &self.redraw,
                TerminalController::window_size(),
                &mut stdout,
            )?;
            if flow == Flow::Quit {
                tracing::debug!("interrupt received");
                return Ok(());
            }
        }
    }

    /// Restore the terminal, stop the worker, discard unconsumed requests.
    ///
    /// Safe to call more than once.
    fn shutdown(&mut self) -> Result<(), EngineError> {
        // Terminal first so any later diagnostic is readable.
        let restored = self.terminal.exit();
        self.shutdown.trigger();

        if let Some(worker) = self.worker.take() {
            let mut requests = worker.join()?;
            let unconsumed = requests.drain();
            if !unconsumed.is_empty() {
                tracing::debug!(count = unconsumed.len(), "discarding unconsumed requests");
            }
        }

        if let Some(input) = self.input_actor.take() {
            input.join();
        }

        tracing::info!(
            responses = self.foreground.view.responses().len(),
            "engine stopped"
        );
        Ok(restored?)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.shutdown();
        }
    }
}

/// Stop a worker that was started before a later startup step failed.
fn stop_worker(shutdown: &ShutdownSignal, worker: WorkerHandle) {
    shutdown.trigger();
    if let Err(e) = worker.join() {
        tracing::warn!(error = %e, "fetch worker did not stop cleanly");
    }
}
