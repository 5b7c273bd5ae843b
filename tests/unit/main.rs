//! Unit test harness for the ungapped seed-extension engine.
//!
//! Tests are organized by stage:
//! - `extension` - exact-match verification variants and masking
//! - `diag` - diagonal linking and the two-hit state machine
//! - `word_finder` - full scan passes and the indexed entry point


mod diag;
mod extension;
