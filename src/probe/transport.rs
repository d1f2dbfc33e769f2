//! The network seam.
//!
//! Probes only talk to a `Transport`. Production runs use the blocking
//! `reqwest` client below; tests swap in scripted transports.

use reqwest::blocking::{Client, Response};
use std::fmt;
use std::io::{self, Read};
use std::time::{Duration, Instant};
use tracing::debug;

use super::endpoint::{Method, ProbeRequest};
use crate::error::{HarnessError, HarnessResult};

/// Maximum time to establish a TCP connection
pub(crate) const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum response body size the harness will read (2MB)
pub(crate) const MAX_BODY_BYTES: u64 = 2 * 1024 * 1024;

/// Raw HTTP exchange result, before any contract is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    pub elapsed: Duration,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The per-call deadline elapsed
    Timeout,
    /// DNS or TCP/TLS connection failure
    Connect,
    /// The request went out but the body could not be read
    Body,
    /// Anything else reported by the HTTP stack
    Other,
}

/// Network-level failure: no usable HTTP response was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            TransportErrorKind::Timeout,
            format!("no response within {}s", after.as_secs()),
        )
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connection failed",
            TransportErrorKind::Body => "body read failed",
            TransportErrorKind::Other => "request failed",
        };
        write!(f, "{label}: {}", self.message)
    }
}

/// Performs exactly one request per call. Implementations must not retry.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &ProbeRequest) -> Result<RawResponse, TransportError>;
}

/// Blocking `reqwest` transport with an explicit per-call timeout
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> HarnessResult<Self> {
        let client = Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .user_agent(concat!("postflight/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HarnessError::HttpClient(e.to_string()))?;
        Ok(Self { client, timeout })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &ProbeRequest) -> Result<RawResponse, TransportError> {
        let started = Instant::now();
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        debug!(method = %request.method, url = %request.url, "sending probe request");
        let response = builder.send().map_err(|e| self.classify(&e))?;
        let status = response.status().as_u16();
        let body = self.read_body(response, started)?;

        Ok(RawResponse {
            status,
            body,
            elapsed: started.elapsed(),
        })
    }
}

impl HttpTransport {
    fn classify(&self, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::timeout(self.timeout)
        } else if err.is_connect() {
            TransportError::new(TransportErrorKind::Connect, err.to_string())
        } else {
            TransportError::new(TransportErrorKind::Other, err.to_string())
        }
    }

    /// Read the body, refusing anything larger than MAX_BODY_BYTES.
    /// Checks Content-Length first, then enforces the limit while streaming.
    fn read_body(&self, response: Response, started: Instant) -> Result<String, TransportError> {
        read_with_limit(response, MAX_BODY_BYTES, |err| self.classify_read(&err, started))
    }

    /// A body read that stalls past the deadline is a timeout, not a body error.
    ///
    /// The blocking client surfaces its deadline as an `io::Error` of kind
    /// `Other` wrapping a `reqwest::Error`, so the kind alone is not enough.
    fn classify_read(&self, err: &io::Error, started: Instant) -> TransportError {
        let timed_out = err.kind() == io::ErrorKind::TimedOut
            || err
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
                .is_some_and(reqwest::Error::is_timeout)
            || started.elapsed() >= self.timeout;
        if timed_out {
            TransportError::timeout(self.timeout)
        } else {
            TransportError::new(
                TransportErrorKind::Body,
                format!("failed to read response body: {err}"),
            )
        }
    }
}

fn read_with_limit(
    response: Response,
    max_size: u64,
    on_error: impl Fn(io::Error) -> TransportError,
) -> Result<String, TransportError> {
    if let Some(content_length) = response.content_length() {
        if content_length > max_size {
            return Err(TransportError::new(
                TransportErrorKind::Body,
                format!("Content-Length {content_length} bytes exceeds limit of {max_size} bytes"),
            ));
        }
    }

    let mut bytes = Vec::new();
    let mut reader = response;
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer).map_err(&on_error)?;
        if n == 0 {
            break;
        }
        if bytes.len() as u64 + n as u64 > max_size {
            return Err(TransportError::new(
                TransportErrorKind::Body,
                format!("response body exceeds limit of {max_size} bytes"),
            ));
        }
        bytes.extend_from_slice(&buffer[..n]);
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
