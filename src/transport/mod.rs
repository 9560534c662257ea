//! Transport: the HTTP capability the fetch worker depends on.
//!
//! The worker only sees [`Transport`]: submit a URL, get back a future that
//! resolves once the transfer is over. Dropping the future abandons the
//! transfer, which is how shutdown cancels in-flight work.

mod http;

pub use http::{HttpConfig, HttpTransport};

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// A submitted transfer.
pub type TransferFuture = Pin<Box<dyn Future<Output = TransferOutput> + Send + 'static>>;

/// Per-request transfer failure. Recoverable: the worker records it and moves on.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The submitted line was empty.
    #[error("no URL given")]
    EmptyUrl,
    /// The HTTP client reported a failure (DNS, connect, TLS, timeout, protocol).
    #[error("http transfer failed")]
    Http(#[from] reqwest::Error),
    /// An I/O failure outside the HTTP client.
    #[error("transfer i/o failed")]
    Io(#[from] std::io::Error),
}

/// Everything a finished transfer produced.
#[derive(Debug)]
pub struct TransferOutput {
    /// Body bytes received, including any received before a failure.
    pub body: Vec<u8>,
    /// Status code on completion, or the failure.
    pub result: Result<u16, TransferError>,
}

impl TransferOutput {
    /// A transfer that ended with an HTTP status.
    pub const fn completed(body: Vec<u8>, status: u16) -> Self {
        Self {
            body,
            result: Ok(status),
        }
    }

    /// A transfer that failed after receiving `body`.
    pub const fn failed(body: Vec<u8>, error: TransferError) -> Self {
        Self {
            body,
            result: Err(error),
        }
    }
}

/// Something that can fetch a URL without blocking the calling thread.
pub trait Transport: Send + 'static {
    /// Start fetching `url`. The transfer makes progress while the returned
    /// future is polled.
    fn submit(&self, url: &str) -> TransferFuture;
}
