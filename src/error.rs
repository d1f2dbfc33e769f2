//! Harness-level faults.
//!
//! Anything in here means the harness itself cannot be trusted to report
//! correctly, so the run is aborted and the process exits with code 2.
//! Endpoint failures never end up here; they become `Fail` results.

use thiserror::Error;

/// Process exit code reserved for harness faults
pub const HARNESS_FAULT_EXIT_CODE: i32 = 2;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// The assertion set is malformed (empty, duplicate or invalid names, bad probe input)
    #[error("invalid assertion set: {0}")]
    InvalidAssertionSet(String),

    /// The resolved environment is incomplete or malformed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The data store could not be reached at all during preflight
    #[error("data store unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// The HTTP client could not be constructed
    #[error("cannot build HTTP client: {0}")]
    HttpClient(String),

    /// The engine was driven out of order (e.g. run twice)
    #[error("invalid engine transition: {0}")]
    InvalidState(String),

    /// The engine lost contact with its worker pool
    #[error("worker pool failure: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub fn exit_code(&self) -> i32 {
        HARNESS_FAULT_EXIT_CODE
    }
}

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;
