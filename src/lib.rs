pub mod checks;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod probe;
pub mod report;
pub mod utils;
pub mod validation;

pub use config::Environment;
pub use engine::{CancelToken, Engine, EngineConfig};
pub use error::HarnessError;
pub use report::{CheckStatus, ProbeResult, Report};
