//! Line scanner for corpus text

use crate::common::{Error, Result};

/// Classification of a single corpus line
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// Starts a new case; holds the invocation with the prompt stripped
    Command(&'a str),
    /// Belongs to the current case's expected output (already trimmed)
    Output(&'a str),
    /// Formatting whitespace, ignored
    Blank,
}

fn classify<'a>(line: &'a str, prompt: &str) -> Line<'a> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Line::Blank
    } else if let Some(invocation) = trimmed.strip_prefix(prompt) {
        Line::Command(invocation.trim())
    } else {
        Line::Output(trimmed)
    }
}

/// Split corpus text into parallel command and expected-output columns
///
/// Each command opens an empty output slot; every following output line is
/// appended to the newest slot with a single `\n`. Output that precedes the
/// first command has no slot to go to and is rejected.
pub(super) fn split_columns(text: &str, prompt: &str) -> Result<(Vec<String>, Vec<String>)> {
    let mut lines = text.lines().enumerate().peekable();

    // A literal that opens with a newline leaves one empty first line
    if lines.peek().is_some_and(|(_, line)| line.trim().is_empty()) {
        lines.next();
    }

    lines.try_fold(
        (Vec::new(), Vec::new()),
        |(mut commands, mut outputs): (Vec<String>, Vec<String>), (idx, line)| {
            match classify(line, prompt) {
                Line::Blank => {}
                Line::Command(invocation) => {
                    commands.push(invocation.to_string());
                    outputs.push(String::new());
                }
                Line::Output(text) => {
                    let Some(current) = outputs.last_mut() else {
                        return Err(Error::ParseInconsistency {
                            line: idx + 1,
                            message: format!("output {text:?} appears before any command"),
                        });
                    };
                    current.push_str(text);
                    current.push('\n');
                }
            }
            Ok((commands, outputs))
        },
    )
}
