//! Error types for the replay harness
//!
//! Every failure is terminal for a run. Messages carry enough detail to
//! reproduce the failing case by hand: the exact command string and,
//! for mismatches, both output texts.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the replay harness
#[derive(Error, Debug)]
pub enum Error {
    // === Corpus Errors ===
    #[error("Malformed corpus at line {line}: {message}")]
    ParseInconsistency { line: usize, message: String },

    #[error("Malformed corpus: {commands} commands but {outputs} expected outputs")]
    CaseCountMismatch { commands: usize, outputs: usize },

    // === Execution Errors ===
    #[error("Command '{command}' failed: {failure}")]
    Execution {
        command: String,
        failure: ExecutionFailure,
    },

    #[error("command: {command} returned: {actual:?} but expected {expected:?}")]
    OutputMismatch {
        command: String,
        actual: String,
        expected: String,
    },

    // === Server Errors ===
    #[error("Server failed to start: {0}")]
    ServerStartFailed(String),

    #[error("Server failed to stop cleanly: {0}")]
    ServerStopFailed(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a client invocation could not produce output
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionFailure {
    #[error("command line is empty")]
    EmptyCommand,

    #[error("could not tokenize: {0}")]
    Tokenize(String),

    #[error("could not start '{program}': {error}")]
    Spawn { program: String, error: String },

    #[error("exited with code {code}{}", stderr_suffix(.stderr))]
    ExitCode { code: i32, stderr: String },

    #[error("terminated by signal{}", stderr_suffix(.stderr))]
    Signaled { stderr: String },

    #[error("stdout is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("; stderr: {trimmed}")
    }
}

impl Error {
    /// Create an execution error for a command
    pub fn execution(command: &str, failure: ExecutionFailure) -> Self {
        Self::Execution {
            command: command.to_string(),
            failure,
        }
    }

    /// Create an output mismatch error
    pub fn output_mismatch(command: &str, actual: &str, expected: &str) -> Self {
        Self::OutputMismatch {
            command: command.to_string(),
            actual: actual.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Stable identifier for machine-readable reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ParseInconsistency { .. } | Error::CaseCountMismatch { .. } => {
                "PARSE_INCONSISTENCY"
            }
            Error::Execution { .. } => "EXECUTION_ERROR",
            Error::OutputMismatch { .. } => "OUTPUT_MISMATCH",
            Error::ServerStartFailed(_) | Error::ServerStopFailed(_) => "SERVER_ERROR",
            Error::Config(_) | Error::ConfigParse(_) | Error::FileRead { .. } => "CONFIG_ERROR",
            Error::Io(_) | Error::Json(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_shows_invisible_differences() {
        let err = Error::output_mismatch("zscore zset n1", "(nil)", "(nil)\n");
        let msg = err.to_string();
        assert!(msg.contains("zscore zset n1"));
        assert!(msg.contains(r#""(nil)\n""#), "got: {msg}");
        assert_eq!(err.kind(), "OUTPUT_MISMATCH");
    }

    #[test]
    fn test_exit_code_failure_includes_stderr() {
        let err = Error::execution(
            "client zadd",
            ExecutionFailure::ExitCode {
                code: 2,
                stderr: "connect() error\n".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "Command 'client zadd' failed: exited with code 2; stderr: connect() error"
        );
        assert_eq!(err.kind(), "EXECUTION_ERROR");
    }

    #[test]
    fn test_exit_code_failure_without_stderr() {
        let failure = ExecutionFailure::ExitCode {
            code: 1,
            stderr: String::new(),
        };
        assert_eq!(failure.to_string(), "exited with code 1");
    }
}
