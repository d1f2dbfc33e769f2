//! The assertion set: named, declarative checks over probe responses.
//!
//! Hard contract violations (non-2xx, missing required field, broken row
//! invariant) fail a check. Soft conditions (optional field absent, frontend
//! marker missing, feature richness regression) only warn.

pub mod assertion;
pub mod catalog;
pub mod rules;
mod set;


pub use assertion::{Assertion, Evaluation, Finding, JoinRule, Requirement, RowRule};
pub use catalog::default_assertion_set;
pub use set::{AssertionSet, CheckKind, CheckSpec};
