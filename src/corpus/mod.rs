//! Golden transcript corpus
//!
//! A corpus is plain text: a line starting with the prompt marker is a
//! client invocation, and the non-blank lines below it are the exact
//! output that invocation must print. Case order is significant; later
//! cases depend on server state left behind by earlier ones.

mod parser;

use serde::Serialize;
use std::path::Path;

use crate::common::{Error, Result};

/// Marker that introduces a command line
pub const DEFAULT_PROMPT: &str = "$ ";

/// Sorted-set scenario replayed when no corpus file is given
pub const EMBEDDED: &str = include_str!("../../corpus/zset.txt");

/// One invocation and the output it must produce
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Shell-style invocation line, prompt stripped
    pub command: String,
    /// Exact expected stdout, every line terminated by `\n`
    pub expected_output: String,
}

/// Ordered, immutable sequence of test cases
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Corpus {
    cases: Vec<TestCase>,
}

impl Corpus {
    /// Parse corpus text using the default `$ ` prompt
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_prompt(text, DEFAULT_PROMPT)
    }

    /// Parse corpus text with a custom prompt marker
    ///
    /// Lines are matched after trimming, so leading whitespace in the
    /// prompt is ignored.
    pub fn parse_with_prompt(text: &str, prompt: &str) -> Result<Self> {
        let prompt = prompt.trim_start();
        if prompt.is_empty() {
            return Err(Error::Config("corpus prompt must not be blank".to_string()));
        }
        let (commands, outputs) = parser::split_columns(text, prompt)?;
        Self::from_columns(commands, outputs)
    }

    /// The built-in sorted-set scenario
    pub fn embedded() -> Result<Self> {
        Self::parse(EMBEDDED)
    }

    /// Read and parse a corpus file
    pub fn load(path: &Path, prompt: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse_with_prompt(&text, prompt)
    }

    /// Pair commands with expected outputs, enforcing a one-to-one match
    pub fn from_columns(commands: Vec<String>, outputs: Vec<String>) -> Result<Self> {
        if commands.len() != outputs.len() {
            return Err(Error::CaseCountMismatch {
                commands: commands.len(),
                outputs: outputs.len(),
            });
        }
        let cases = commands
            .into_iter()
            .zip(outputs)
            .map(|(command, expected_output)| TestCase {
                command,
                expected_output,
            })
            .collect();
        Ok(Self { cases })
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.cases.iter()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(|c| c.command.as_str())
    }

    pub fn expected_outputs(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(|c| c.expected_output.as_str())
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_corpus_shape() {
        let corpus = Corpus::embedded().unwrap();
        assert_eq!(corpus.len(), 12);
        assert_eq!(corpus.commands().count(), corpus.expected_outputs().count());

        let first = &corpus.cases()[0];
        assert_eq!(first.command, "bazel run //client:client -- zscore asdf n1");
        assert_eq!(first.expected_output, "(nil)\n");

        let full_query = &corpus.cases()[6];
        assert_eq!(
            full_query.command,
            r#"bazel run //client:client -- zquery zset 1 "" 0 10"#
        );
        assert_eq!(
            full_query.expected_output,
            "(arr) len=4\n(str) n1\n(double) 1.1\n(str) n2\n(double) 2\n(arr) end\n"
        );
    }

    #[test]
    fn test_from_columns_rejects_count_mismatch() {
        let err = Corpus::from_columns(
            vec!["a".to_string(), "b".to_string()],
            vec!["x\n".to_string()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::CaseCountMismatch {
                commands: 2,
                outputs: 1
            }
        ));
    }

    #[test]
    fn test_blank_prompt_is_rejected() {
        assert!(matches!(
            Corpus::parse_with_prompt("$ a\n", "  "),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_prompt_leading_whitespace_ignored() {
        let corpus = Corpus::parse_with_prompt("  > zscore k n\n(nil)\n", " > ").unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.cases()[0].command, "zscore k n");
        assert_eq!(corpus.cases()[0].expected_output, "(nil)\n");
    }

    #[test]
    fn test_serializes_as_case_list() {
        let corpus = Corpus::parse("$ zscore k n\n(nil)\n").unwrap();
        let json = serde_json::to_value(&corpus).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "command": "zscore k n", "expected_output": "(nil)\n" }])
        );
    }
}
