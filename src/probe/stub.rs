//! Scripted transport for unit tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use super::endpoint::ProbeRequest;
use super::transport::{RawResponse, Transport, TransportError};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Respond {
        status: u16,
        body: String,
        delay: Duration,
    },
    Fail(TransportError),
}

/// Replies keyed by URL path; unknown paths answer 404
#[derive(Default)]
pub(crate) struct StubTransport {
    replies: HashMap<String, Reply>,
    pub(crate) seen: Mutex<Vec<ProbeRequest>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(mut self, path: &str, status: u16, body: impl Into<String>) -> Self {
        self.replies.insert(
            path.to_string(),
            Reply::Respond {
                status,
                body: body.into(),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub(crate) fn delayed(
        mut self,
        path: &str,
        delay: Duration,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        self.replies.insert(
            path.to_string(),
            Reply::Respond {
                status,
                body: body.into(),
                delay,
            },
        );
        self
    }

    pub(crate) fn fail(mut self, path: &str, err: TransportError) -> Self {
        self.replies.insert(path.to_string(), Reply::Fail(err));
        self
    }
}

impl Transport for StubTransport {
    fn execute(&self, request: &ProbeRequest) -> Result<RawResponse, TransportError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        match self.replies.get(request.url.path()) {
            Some(Reply::Respond {
                status,
                body,
                delay,
            }) => {
                if !delay.is_zero() {
                    thread::sleep(*delay);
                }
                Ok(RawResponse {
                    status: *status,
                    body: body.clone(),
                    elapsed: *delay,
                })
            }
            Some(Reply::Fail(err)) => Err(err.clone()),
            None => Ok(RawResponse::new(404, "not found")),
        }
    }
}
