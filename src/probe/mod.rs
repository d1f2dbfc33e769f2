//! Probes: one request, one typed outcome.
//!
//! A probe binds an endpoint contract to the run environment, performs exactly
//! one call through a `Transport`, and converts every failure mode into a
//! `ProbeError`. Nothing escapes the probe boundary as a panic or an untyped
//! error, and nothing is retried.
//!
//! # Side effects
//!
//! Probes against the subscription-creation and webhook functions are not
//! read-only: they may create a real customer record or emit a real
//! acknowledgement on every run. Those probes are marked `mutating` so the
//! harness can report them and `--skip-mutating` can leave them out.

mod endpoint;
mod outcome;
mod transport;

#[cfg(test)]
pub(crate) mod stub;

pub use endpoint::{Credential, EndpointSpec, Method, ProbeRequest, Target};
pub use outcome::{ProbeError, ProbeResponse};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError, TransportErrorKind};

use tracing::debug;

use crate::config::Environment;
use crate::error::HarnessResult;

/// A named request bound to one endpoint contract
#[derive(Debug, Clone)]
pub struct Probe {
    pub label: String,
    pub endpoint: EndpointSpec,
    /// Whether the call has real external effects
    pub mutating: bool,
}

impl Probe {
    pub fn new(label: impl Into<String>, endpoint: EndpointSpec) -> Self {
        Self {
            label: label.into(),
            endpoint,
            mutating: false,
        }
    }

    pub fn mutating(mut self) -> Self {
        self.mutating = true;
        self
    }

    /// Resolve the request without sending it
    pub fn request(&self, env: &Environment) -> HarnessResult<ProbeRequest> {
        self.endpoint.build(env)
    }

    /// Send the request once and classify the outcome
    pub fn execute(
        &self,
        request: &ProbeRequest,
        transport: &dyn Transport,
    ) -> Result<ProbeResponse, ProbeError> {
        let raw = transport.execute(request).map_err(ProbeError::Network)?;
        debug!(
            probe = %self.label,
            status = raw.status,
            elapsed_ms = raw.elapsed.as_millis() as u64,
            "probe response received"
        );
        ProbeResponse::from_raw(raw)
    }
}
