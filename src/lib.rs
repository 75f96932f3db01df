//! Golden transcript replay harness
//!
//! Replays an ordered corpus of client invocations against a live server
//! and requires every invocation's stdout to match the recorded transcript
//! exactly.

pub mod cli;
pub mod commands;
pub mod common;
pub mod corpus;
pub mod harness;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use corpus::{Corpus, TestCase};
pub use harness::{replay, run_corpus, RunState, RunSummary};
