//! Integration tests for postflight
//!
//! These tests drive the full engine and default assertion set against a
//! scripted in-memory transport standing in for a deployed stack.

pub mod config_file;
pub mod degraded_stack;
pub mod helpers;
pub mod run_control;
