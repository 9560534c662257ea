//! Fetch Worker: background thread that performs one transfer at a time.
//!
//! The worker is a small state machine driven by [`FetchWorker::turn`]. Each
//! turn performs exactly one unified wait:
//!
//! ```text
//!            request / reserve slot
//!   ┌──────┐ ─────────────────────▶ ┌──────────────┐
//!   │ Idle │                        │ Transferring │
//!   └──────┘ ◀───────────────────── └──────────────┘
//!      │      publish + redraw signal       │
//!      │ done                          done │ (transfer abandoned)
//!      ▼                                    ▼
//!   ┌────────────────────────────────────────────┐
//!   │                 Terminated                 │
//!   └────────────────────────────────────────────┘
//! ```
//!
//! Every wait is bounded by the liveness timeout, so `done` is re-checked at
//! least that often even if a wake-up were missed.

use crate::buffer::{BufferError, Outcome, Response, ResponseWriter, SlotId};
use crate::channel::{PendingRequest, RedrawCause, RedrawSender, RequestReceiver, ShutdownSignal};
use crate::terminal::fatal;
use crate::transport::{TransferError, TransferFuture, TransferOutput, Transport};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Upper bound on any single wait of the worker.
pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Worker failures. Every one of them is fatal to the process.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The response buffer rejected a reservation or publish.
    #[error(transparent)]
    Buffer(#[from] BufferError),
    /// The worker's async runtime could not be created.
    #[error("failed to start the fetch worker runtime")]
    Runtime(#[source] io::Error),
    /// The worker thread panicked.
    #[error("fetch worker thread panicked")]
    Panicked,
}

/// Observable worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// Waiting for a request or shutdown.
    Idle,
    /// One transfer in flight, targeting `slot` of the response buffer.
    Transferring {
        /// Reserved response slot.
        slot: usize,
    },
    /// The loop has ended.
    Terminated,
}

struct ActiveTransfer {
    slot: SlotId,
    request: PendingRequest,
    started: Instant,
    future: TransferFuture,
}

enum State {
    Idle,
    Transferring(ActiveTransfer),
    Terminated,
}

/// What ended a wait.
enum Wake {
    Shutdown,
    Request(Option<PendingRequest>),
    Finished(TransferOutput),
    Timeout,
}

/// The worker-owned half of the process state.
pub struct FetchWorker<T> {
    transport: T,
    requests: RequestReceiver,
    responses: ResponseWriter,
    redraw: RedrawSender,
    shutdown: ShutdownSignal,
    liveness: Duration,
    state: State,
}

impl<T: Transport> FetchWorker<T> {
    /// Assemble a worker in the `Idle` phase.
    pub fn new(
        transport: T,
        requests: RequestReceiver,
        responses: ResponseWriter,
        redraw: RedrawSender,
        shutdown: ShutdownSignal,
        liveness: Duration,
    ) -> Self {
        Self {
            transport,
            requests,
            responses,
            redraw,
            shutdown,
            liveness,
            state: State::Idle,
        }
    }

    /// Current phase of the state machine.
    pub const fn phase(&self) -> WorkerPhase {
        match &self.state {
            State::Idle => WorkerPhase::Idle,
            State::Transferring(active) => WorkerPhase::Transferring {
                slot: active.slot.index(),
            },
            State::Terminated => WorkerPhase::Terminated,
        }
    }

    /// Perform one wait and act on whatever ended it.
    ///
    /// # Errors
    ///
    /// Returns an error when the response buffer is exhausted or used out of
    /// order. Both mean a design limit was hit and the worker must stop.
    pub async fn turn(&mut self) -> Result<WorkerPhase, WorkerError> {
        if self.shutdown.is_triggered() {
            self.terminate("shutdown requested");
            return Ok(self.phase());
        }

        let liveness = tokio::time::sleep(self.liveness);
        let wake = match &mut self.state {
            State::Idle => tokio::select! {
                biased;
                () = self.shutdown.woken() => Wake::Shutdown,
                request = self.requests.recv() => Wake::Request(request),
                () = liveness => Wake::Timeout,
            },
            // Requests stay queued until the transfer is over.
            State::Transferring(active) => tokio::select! {
                biased;
                () = self.shutdown.woken() => Wake::Shutdown,
                output = &mut active.future => Wake::Finished(output),
                () = liveness => Wake::Timeout,
            },
            State::Terminated => return Ok(WorkerPhase::Terminated),
        };

        match wake {
            Wake::Shutdown => self.terminate("shutdown requested"),
            Wake::Timeout => {
                tracing::trace!(phase = ?self.phase(), "liveness check");
            }
            Wake::Request(Some(request)) => self.begin(request)?,
            Wake::Request(None) => self.terminate("request channel closed"),
            Wake::Finished(output) => self.complete(output)?,
        }

        Ok(self.phase())
    }

    /// Run turns until the worker terminates, then hand back the request
    /// receiver so unconsumed requests can be drained.
    ///
    /// # Errors
    ///
    /// Propagates the first [`WorkerError`] from [`turn`](Self::turn).
    pub async fn run(mut self) -> Result<RequestReceiver, WorkerError> {
        tracing::debug!("fetch worker started");
        while self.turn().await? != WorkerPhase::Terminated {}
        tracing::debug!("fetch worker stopped");
        Ok(self.requests)
    }

    fn begin(&mut self, request: PendingRequest) -> Result<(), WorkerError> {
        let slot = self.responses.reserve()?;
        tracing::debug!(
            seq = request.seq,
            slot = slot.index(),
            url = %request.url,
            "transfer started"
        );

        let future = self.transport.submit(&request.url);
        self.state = State::Transferring(ActiveTransfer {
            slot,
            request,
            started: Instant::now(),
            future,
        });
        Ok(())
    }

    fn complete(&mut self, output: TransferOutput) -> Result<(), WorkerError> {
        let State::Transferring(active) = std::mem::replace(&mut self.state, State::Idle) else {
            return Ok(());
        };
        let elapsed = active.started.elapsed();

        let outcome = match output.result {
            Ok(status) => {
                tracing::debug!(
                    seq = active.request.seq,
                    status,
                    bytes = output.body.len(),
                    ?elapsed,
                    "transfer completed"
                );
                Outcome::Completed { status }
            }
            Err(e) => {
                let reason = describe(e);
                tracing::warn!(
                    seq = active.request.seq,
                    url = %active.request.url,
                    %reason,
                    "transfer failed"
                );
                Outcome::Failed { reason }
            }
        };

        let response = Response::new(active.request.url, output.body, outcome);
        self.responses.publish(active.slot, response)?;
        self.redraw.notify(RedrawCause::DATA);
        Ok(())
    }

    fn terminate(&mut self, reason: &str) {
        let previous = std::mem::replace(&mut self.state, State::Terminated);
        if let State::Transferring(active) = previous {
            tracing::debug!(
                seq = active.request.seq,
                url = %active.request.url,
                "abandoning in-flight transfer"
            );
        }
        tracing::debug!(reason, "fetch worker terminating");
    }
}

impl<T: Transport> FetchWorker<T> {
    /// Run the worker on its own thread with a current-thread runtime.
    ///
    /// A [`WorkerError`] inside the thread is fatal to the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS fails to spawn the thread.
    pub fn spawn(self) -> io::Result<WorkerHandle> {
        let handle = thread::Builder::new()
            .name("fetchpane-worker".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => fatal(&WorkerError::Runtime(e)),
                };

                let result = runtime.block_on(self.run());
                // In-flight work was abandoned; do not wait for it.
                runtime.shutdown_background();

                match result {
                    Ok(requests) => requests,
                    Err(e) => fatal(&e),
                }
            })?;

        Ok(WorkerHandle { handle })
    }
}

/// Join handle for a spawned worker.
#[derive(Debug)]
pub struct WorkerHandle {
    handle: JoinHandle<RequestReceiver>,
}

impl WorkerHandle {
    /// Wait for the worker to stop and take back its request receiver.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Panicked`] if the worker thread panicked.
    pub fn join(self) -> Result<RequestReceiver, WorkerError> {
        self.handle.join().map_err(|_| WorkerError::Panicked)
    }
}

/// Render an error and its sources on one line.
fn describe(error: TransferError) -> String {
    format!("{:#}", anyhow::Error::from(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{response_buffer, ResponseReader};
    use crate::channel::{redraw_channel, request_channel, RedrawReceiver, RequestSender};
    use std::sync::{Arc, Mutex};
    use tokio::runtime::Runtime;
    use tokio::sync::Notify;

    const TICK: Duration = Duration::from_millis(20);

    /// Answers every URL in-process. URLs containing "fail" are refused.
    /// When gated, each transfer waits for one permit on the gate.
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        gate: Option<Arc<Notify>>,
        submitted: Arc<Mutex<Vec<String>>>,
    }

    impl Transport for ScriptedTransport {
        fn submit(&self, url: &str) -> TransferFuture {
            self.submitted.lock().unwrap().push(url.to_string());
            let gate = self.gate.clone();
            let url = url.to_string();
            Box::pin(async move {
                if let Some(gate) = gate {
                    gate.notified().await;
                }
                if url.contains("fail") {
                    let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
                    TransferOutput::failed(Vec::new(), TransferError::Io(refused))
                } else {
                    TransferOutput::completed(format!("body of {url}\n").into_bytes(), 200)
                }
            })
        }
    }

    struct Harness {
        worker: FetchWorker<ScriptedTransport>,
        requests: RequestSender,
        reader: ResponseReader,
        redraw: RedrawReceiver,
        shutdown: ShutdownSignal,
        gate: Arc<Notify>,
        submitted: Arc<Mutex<Vec<String>>>,
        rt: Runtime,
    }

    impl Harness {
        fn new(capacity: usize, gated: bool) -> Self {
            let gate = Arc::new(Notify::new());
            let transport = ScriptedTransport {
                gate: gated.then(|| Arc::clone(&gate)),
                submitted: Arc::default(),
            };
            let submitted = Arc::clone(&transport.submitted);
            let (requests, request_rx) = request_channel();
            let (writer, reader) = response_buffer(capacity);
            let (redraw_tx, redraw) = redraw_channel();
            let shutdown = ShutdownSignal::new();
            let worker = FetchWorker::new(
                transport,
                request_rx,
                writer,
                redraw_tx,
                shutdown.clone(),
                TICK,
            );
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            Self {
                worker,
                requests,
                reader,
                redraw,
                shutdown,
                gate,
                submitted,
                rt,
            }
        }

        fn turn(&mut self) -> Result<WorkerPhase, WorkerError> {
            self.rt.block_on(self.worker.turn())
        }

        fn submitted(&self) -> Vec<String> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_idle_request_starts_transfer_without_publishing() {
        let mut h = Harness::new(8, true);
        assert_eq!(h.worker.phase(), WorkerPhase::Idle);

        h.requests.send("http://a/").unwrap();
        assert_eq!(h.turn().unwrap(), WorkerPhase::Transferring { slot: 0 });
        assert_eq!(h.reader.len(), 0);
        assert_eq!(h.submitted(), ["http://a/"]);
    }

    #[test]
    fn test_completion_publishes_then_signals_once() {
        let mut h = Harness::new(8, false);
        h.requests.send("http://a/").unwrap();

        assert_eq!(h.turn().unwrap(), WorkerPhase::Transferring { slot: 0 });
        assert_eq!(h.turn().unwrap(), WorkerPhase::Idle);

        assert_eq!(h.reader.len(), 1);
        let response = h.reader.get(0).unwrap();
        assert_eq!(response.payload(), Some(&b"body of http://a/\n"[..]));
        assert_eq!(response.outcome(), &Outcome::Completed { status: 200 });

        assert_eq!(h.redraw.drain(), RedrawCause::DATA);
        assert_eq!(h.redraw.wait(Duration::ZERO), None);
    }

    #[test]
    fn test_idle_timeout_keeps_waiting() {
        let mut h = Harness::new(8, false);
        assert_eq!(h.turn().unwrap(), WorkerPhase::Idle);
        assert_eq!(h.reader.len(), 0);
        assert!(!h.redraw.is_pending());
    }

    #[test]
    fn test_second_request_waits_until_idle() {
        let mut h = Harness::new(8, true);
        h.requests.send("http://first/").unwrap();
        h.requests.send("http://second/").unwrap();

        assert_eq!(h.turn().unwrap(), WorkerPhase::Transferring { slot: 0 });
        // Liveness timeout while the first transfer is still gated.
        assert_eq!(h.turn().unwrap(), WorkerPhase::Transferring { slot: 0 });
        assert_eq!(h.submitted(), ["http://first/"]);

        h.gate.notify_one();
        assert_eq!(h.turn().unwrap(), WorkerPhase::Idle);
        assert_eq!(h.reader.len(), 1);

        assert_eq!(h.turn().unwrap(), WorkerPhase::Transferring { slot: 1 });
        assert_eq!(h.submitted(), ["http://first/", "http://second/"]);
    }

    #[test]
    fn test_failed_transfer_records_absent_payload() {
        let mut h = Harness::new(8, false);
        h.requests.send("http://example.com/fail-dns-xyz").unwrap();

        h.turn().unwrap();
        assert_eq!(h.turn().unwrap(), WorkerPhase::Idle);

        assert_eq!(h.reader.len(), 1);
        let response = h.reader.get(0).unwrap();
        assert!(response.payload().is_none());
        assert!(response.is_failed());
        assert_eq!(response.url(), "http://example.com/fail-dns-xyz");

        assert_eq!(h.redraw.drain(), RedrawCause::DATA);
        assert!(!h.redraw.is_pending());
    }

    #[test]
    fn test_responses_keep_submission_order() {
        let mut h = Harness::new(8, false);
        let urls = ["http://1/", "http://fail/", "http://3/", "http://4/", "http://5/"];
        for url in urls {
            h.requests.send(url).unwrap();
        }

        for _ in 0..urls.len() * 2 {
            h.turn().unwrap();
        }

        assert_eq!(h.reader.len(), urls.len());
        let stored: Vec<_> = (0..urls.len())
            .map(|i| h.reader.get(i).unwrap().url().to_string())
            .collect();
        assert_eq!(stored, urls);
    }

    #[test]
    fn test_capacity_exhaustion_is_fatal() {
        let mut h = Harness::new(1, false);
        h.requests.send("http://a/").unwrap();
        h.requests.send("http://b/").unwrap();

        h.turn().unwrap();
        assert_eq!(h.turn().unwrap(), WorkerPhase::Idle);

        let err = h.turn().unwrap_err();
        assert!(matches!(
            err,
            WorkerError::Buffer(BufferError::Full { capacity: 1 })
        ));
        assert_eq!(h.reader.len(), 1);
    }

    #[test]
    fn test_shutdown_abandons_in_flight_transfer() {
        let mut h = Harness::new(8, true);
        h.requests.send("http://slow/").unwrap();
        assert_eq!(h.turn().unwrap(), WorkerPhase::Transferring { slot: 0 });

        h.shutdown.trigger();
        assert_eq!(h.turn().unwrap(), WorkerPhase::Terminated);
        assert_eq!(h.reader.len(), 0);
        assert!(!h.redraw.is_pending());

        // Terminated is final.
        assert_eq!(h.turn().unwrap(), WorkerPhase::Terminated);
    }

    #[test]
    fn test_run_hands_back_unconsumed_requests() {
        let mut h = Harness::new(8, true);
        h.requests.send("http://slow/").unwrap();
        h.requests.send("http://queued/").unwrap();
        h.turn().unwrap();

        h.shutdown.trigger();
        let mut leftover = h.rt.block_on(h.worker.run()).unwrap();
        let urls: Vec<_> = leftover.drain().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, ["http://queued/"]);
    }

    #[test]
    fn test_closed_request_channel_terminates() {
        let mut h = Harness::new(8, false);
        // Swapping in an unrelated sender drops the only one the worker listens to.
        h.requests = request_channel().0;

        assert_eq!(h.turn().unwrap(), WorkerPhase::Terminated);
    }

    #[test]
    fn test_spawned_worker_exits_promptly_mid_transfer() {
        let gate = Arc::new(Notify::new());
        let transport = ScriptedTransport {
            gate: Some(Arc::clone(&gate)),
            submitted: Arc::default(),
        };
        let submitted = Arc::clone(&transport.submitted);
        let (mut requests, request_rx) = request_channel();
        let (writer, reader) = response_buffer(8);
        let (redraw_tx, _redraw) = redraw_channel();
        let shutdown = ShutdownSignal::new();

        let handle = FetchWorker::new(
            transport,
            request_rx,
            writer,
            redraw_tx,
            shutdown.clone(),
            DEFAULT_LIVENESS_TIMEOUT,
        )
        .spawn()
        .unwrap();

        requests.send("http://never-finishes/").unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while submitted.lock().unwrap().is_empty() {
            assert!(Instant::now() < deadline, "transfer never started");
            thread::sleep(Duration::from_millis(5));
        }

        let stopping = Instant::now();
        shutdown.trigger();
        let mut leftover = handle.join().unwrap();

        assert!(stopping.elapsed() < DEFAULT_LIVENESS_TIMEOUT);
        assert!(leftover.drain().is_empty());
        assert_eq!(reader.len(), 0);
    }

    #[test]
    fn test_describe_includes_sources() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let text = describe(TransferError::Io(refused));
        assert_eq!(text, "transfer i/o failed: refused");
    }
}
