//! Verification engine.
//!
//! Checks run concurrently on a small pool of named worker threads. The
//! collector owns the result slots, so results land in declaration order no
//! matter when each check finishes. A check that outlives its deadline is
//! recorded as a timeout and its worker is abandoned.

mod cancel;
mod config;
mod runner;
mod state;


pub use cancel::CancelToken;
pub use config::{
    EngineConfig, DEFAULT_PROBE_TIMEOUT, DEFAULT_WATCHDOG_GRACE, MAX_PROBE_TIMEOUT, MAX_WORKERS,
    MIN_PROBE_TIMEOUT,
};
pub use runner::Engine;
pub use state::EngineState;
