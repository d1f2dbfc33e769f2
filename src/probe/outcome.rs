//! Typed probe outcomes

use serde_json::Value;
use std::fmt;

use super::transport::{RawResponse, TransportError};
use crate::utils::snippet;

/// Every way a probe can fail to deliver a usable response
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// DNS, connect, timeout or body-read failure
    Network(TransportError),
    /// The endpoint answered with a non-2xx status
    Status { status: u16, snippet: String },
    /// The body does not have the shape the contract promises
    Malformed { reason: String, snippet: String },
}

impl ProbeError {
    pub fn is_network(&self) -> bool {
        matches!(self, ProbeError::Network(_))
    }

    pub fn snippet(&self) -> Option<&str> {
        match self {
            ProbeError::Network(_) => None,
            ProbeError::Status { snippet, .. } | ProbeError::Malformed { snippet, .. } => {
                Some(snippet.as_str())
            }
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Network(err) => write!(f, "network error ({err})"),
            ProbeError::Status { status, .. } => write!(f, "HTTP {status}"),
            ProbeError::Malformed { reason, .. } => write!(f, "malformed response: {reason}"),
        }
    }
}

/// A 2xx response, with helpers to interpret its body
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub raw: RawResponse,
}

impl ProbeResponse {
    pub fn from_raw(raw: RawResponse) -> Result<Self, ProbeError> {
        if raw.is_success() {
            Ok(Self { raw })
        } else {
            Err(ProbeError::Status {
                status: raw.status,
                snippet: snippet(&raw.body),
            })
        }
    }

    pub fn status(&self) -> u16 {
        self.raw.status
    }

    pub fn text(&self) -> &str {
        &self.raw.body
    }

    pub fn snippet(&self) -> String {
        snippet(&self.raw.body)
    }

    pub fn json(&self) -> Result<Value, ProbeError> {
        serde_json::from_str(&self.raw.body).map_err(|e| ProbeError::Malformed {
            reason: format!("body is not JSON: {e}"),
            snippet: self.snippet(),
        })
    }
}
