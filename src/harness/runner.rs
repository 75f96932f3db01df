//! Client command execution
//!
//! Each corpus command is split with POSIX shell quoting rules and run as
//! its own foreground subprocess. Only stdout is the product; stderr is
//! kept for failure reports.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::common::config::ClientConfig;
use crate::common::{Error, ExecutionFailure, Result};

/// Something that turns a command line into its captured output
#[async_trait]
pub trait Execute: Send + Sync {
    /// Run `command` to completion and return its stdout verbatim
    async fn execute(&self, command: &str) -> Result<String>;
}

/// Split a command line into an argument vector
///
/// Quoted substrings form one argument, and `""` is a genuine empty
/// argument rather than nothing. There is no comment syntax: a word
/// starting with `#` is an ordinary argument.
pub fn tokenize(command: &str) -> std::result::Result<Vec<String>, ExecutionFailure> {
    let argv = shell_words::split(&escape_comments(command))
        .map_err(|e| ExecutionFailure::Tokenize(e.to_string()))?;
    if argv.is_empty() {
        return Err(ExecutionFailure::EmptyCommand);
    }
    Ok(argv)
}

/// Backslash-escape every unquoted `#` that begins a word
///
/// `shell_words` drops the rest of the line at such a `#`.
fn escape_comments(command: &str) -> String {
    let mut out = String::with_capacity(command.len());
    let mut single = false;
    let mut double = false;
    let mut escaped = false;
    let mut word_start = true;

    for c in command.chars() {
        if single {
            single = c != '\'';
        } else if double {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                double = false;
            }
        } else if escaped {
            escaped = false;
            word_start = false;
        } else if c.is_whitespace() {
            word_start = true;
        } else {
            if c == '#' && word_start {
                out.push('\\');
            }
            word_start = false;
            match c {
                '\\' => escaped = true,
                '\'' => single = true,
                '"' => double = true,
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

/// Runs client invocations as real subprocesses
#[derive(Debug, Default, Clone)]
pub struct CommandRunner {
    working_dir: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            working_dir: config.working_dir.clone(),
            env: config.env.clone(),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl Execute for CommandRunner {
    async fn execute(&self, command: &str) -> Result<String> {
        let argv = tokenize(command).map_err(|f| Error::execution(command, f))?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::execution(command, ExecutionFailure::EmptyCommand))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(?argv, "Executing client command");

        let output = cmd.output().await.map_err(|e| {
            Error::execution(
                command,
                ExecutionFailure::Spawn {
                    program: program.clone(),
                    error: e.to_string(),
                },
            )
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stderr.is_empty() {
            tracing::trace!(%stderr, "Client stderr");
        }

        if !output.status.success() {
            let failure = match output.status.code() {
                Some(code) => ExecutionFailure::ExitCode { code, stderr },
                None => ExecutionFailure::Signaled { stderr },
            };
            return Err(Error::execution(command, failure));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| Error::execution(command, ExecutionFailure::InvalidUtf8(e.to_string())))
    }
}
