//! Transport contract
//!
//! Narrow seam between the backend encoders and the network. Providers build a
//! fully encoded [`TransportRequest`] and hand it to a [`Transport`]; nothing
//! above this module knows how bytes are moved.

use parking_lot::Mutex;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::io::Write;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Transport-level failures
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An encoded batch ready to be POSTed to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub url: String,
    pub content_type: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TransportRequest {
    pub fn new(url: impl Into<String>, content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            content_type,
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Moves one encoded request to its destination.
pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest) -> Result<(), TransportError>;
}

const TRANSPORT_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const TRANSPORT_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP transport.
///
/// Uses `reqwest::blocking`, so it must not be created or used from inside an
/// async runtime's worker thread.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(TRANSPORT_HTTP_CONNECT_TIMEOUT)
            .timeout(TRANSPORT_HTTP_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: TransportRequest) -> Result<(), TransportError> {
        debug!(url = %request.url, bytes = request.body.len(), "Sending transport request");

        let mut builder = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, request.content_type);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(request.body).send()?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Status { status, body });
        }

        Ok(())
    }
}

/// Writes requests to a sink instead of sending them.
pub struct DryRunTransport {
    out: Mutex<Box<dyn Write + Send>>,
}

impl DryRunTransport {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl Transport for DryRunTransport {
    fn send(&self, request: TransportRequest) -> Result<(), TransportError> {
        let mut out = self.out.lock();
        writeln!(out, "POST {} ({})", request.url, request.content_type)?;
        for (name, _) in &request.headers {
            // header values may carry credentials
            writeln!(out, "{}: ***", name)?;
        }
        writeln!(out, "{}", String::from_utf8_lossy(&request.body))?;
        out.flush()?;
        Ok(())
    }
}
