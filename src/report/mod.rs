//! Results and their aggregation.
//!
//! `Report` is the structured form consumed by CI; `render` turns it into the
//! narrative operators read. Rendering never feeds back into pass/fail.

pub mod render;
mod result;
mod summary;


pub use result::{CheckStatus, FailureKind, ProbeResult};
pub use summary::{Counts, Report, EXIT_FAILED, EXIT_OK};
