//! `HttpTransport`: reqwest-backed transfers with streamed bodies.

use super::{TransferError, TransferFuture, TransferOutput, Transport};
use std::time::Duration;

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Limit for DNS resolution plus TCP/TLS connection setup.
    pub connect_timeout: Duration,
    /// Limit for a whole transfer. `None` lets a transfer run indefinitely.
    pub timeout: Option<Duration>,
    /// Honour the platform's proxy settings.
    pub use_system_proxy: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(10),
            timeout: Some(Duration::from_secs(60)),
            use_system_proxy: true,
        }
    }
}

/// Fetches URLs over one shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build the client. Done once per process.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &HttpConfig) -> Result<Self, TransferError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Transport for HttpTransport {
    fn submit(&self, url: &str) -> TransferFuture {
        let client = self.client.clone();
        let url = url.trim().to_string();

        Box::pin(async move {
            let mut body = Vec::new();
            match fetch_into(&client, &url, &mut body).await {
                Ok(status) => TransferOutput::completed(body, status),
                Err(e) => TransferOutput::failed(body, e),
            }
        })
    }
}

/// Stream the body of `url` into `body` chunk by chunk.
async fn fetch_into(
    client: &reqwest::Client,
    url: &str,
    body: &mut Vec<u8>,
) -> Result<u16, TransferError> {
    if url.is_empty() {
        return Err(TransferError::EmptyUrl);
    }

    let mut response = client.get(url).send().await?;
    let status = response.status().as_u16();
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn direct() -> HttpConfig {
        HttpConfig {
            use_system_proxy: false,
            ..HttpConfig::default()
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    /// Serve exactly one HTTP response on a local port.
    fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, std::thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).unwrap();
            let reply = format!(
                "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).unwrap();
        });
        (url, handle)
    }

    #[test]
    fn test_fetch_streams_body() {
        let (url, server) = serve_once("HTTP/1.1 200 OK", "hello\nworld\n");
        let transport = HttpTransport::new(&direct()).unwrap();

        let output = runtime().block_on(transport.submit(&url));
        server.join().unwrap();

        assert_eq!(output.result.unwrap(), 200);
        assert_eq!(output.body, b"hello\nworld\n");
    }

    #[test]
    fn test_error_status_keeps_body() {
        let (url, server) = serve_once("HTTP/1.1 404 Not Found", "missing");
        let transport = HttpTransport::new(&direct()).unwrap();

        let output = runtime().block_on(transport.submit(&url));
        server.join().unwrap();

        assert_eq!(output.result.unwrap(), 404);
        assert_eq!(output.body, b"missing");
    }

    #[test]
    fn test_connection_refused_is_a_failed_transfer() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = HttpTransport::new(&direct()).unwrap();

        let output = runtime().block_on(transport.submit(&format!("http://127.0.0.1:{port}/")));

        assert!(matches!(output.result, Err(TransferError::Http(_))));
        assert!(output.body.is_empty());
    }

    #[test]
    fn test_empty_url_fails_without_network() {
        let transport = HttpTransport::new(&direct()).unwrap();
        let output = runtime().block_on(transport.submit("   "));
        assert!(matches!(output.result, Err(TransferError::EmptyUrl)));
    }

    #[test]
    fn test_malformed_url_is_a_failed_transfer() {
        let transport = HttpTransport::new(&direct()).unwrap();
        let output = runtime().block_on(transport.submit("not a url"));
        assert!(matches!(output.result, Err(TransferError::Http(_))));
    }
}
