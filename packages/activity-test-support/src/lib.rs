//! Test support for code that asserts on SQL activity.
//!
//! Provides [`ActivityHarness`], which wires a recorder to an instrumented
//! connection for a single test, plus unified logging initialization and
//! helpers for unique test data.

pub mod harness;
pub mod logging;
pub mod unique_helpers;

pub use harness::{ActivityHarness, HarnessError};
