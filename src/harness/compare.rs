//! Exact-match comparison of captured output

use crate::common::{Error, Result};
use crate::corpus::TestCase;

/// Judge one case: the actual output must equal the expected output byte for byte
pub fn compare(case: &TestCase, actual: &str) -> Result<()> {
    if actual == case.expected_output {
        Ok(())
    } else {
        Err(Error::output_mismatch(
            &case.command,
            actual,
            &case.expected_output,
        ))
    }
}

/// 1-based line number where two texts first differ, `None` when equal
pub fn first_divergent_line(actual: &str, expected: &str) -> Option<usize> {
    if actual == expected {
        return None;
    }
    let offset = actual
        .bytes()
        .zip(expected.bytes())
        .position(|(a, e)| a != e)
        .unwrap_or_else(|| actual.len().min(expected.len()));
    let newlines = actual.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count();
    Some(newlines + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(expected_output: &str) -> TestCase {
        TestCase {
            command: "zscore zset n1".to_string(),
            expected_output: expected_output.to_string(),
        }
    }

    #[test]
    fn test_exact_match_passes() {
        assert!(compare(&case("(double) 1.1\n"), "(double) 1.1\n").is_ok());
        assert!(compare(&case(""), "").is_ok());
    }

    #[test]
    fn test_trailing_newline_difference_is_mismatch() {
        let err = compare(&case("(nil)\n"), "(nil)").unwrap_err();
        match err {
            Error::OutputMismatch {
                command,
                actual,
                expected,
            } => {
                assert_eq!(command, "zscore zset n1");
                assert_eq!(actual, "(nil)");
                assert_eq!(expected, "(nil)\n");
            }
            other => panic!("Expected OutputMismatch, got {other:?}"),
        }

        assert!(compare(&case("(nil)\n"), "(nil)\n\n").is_err());
    }

    #[test]
    fn test_whitespace_is_significant() {
        assert!(compare(&case("(int) 1\n"), "(int)  1\n").is_err());
        assert!(compare(&case("(int) 1\n"), " (int) 1\n").is_err());
        assert!(compare(&case("(int) 1\n"), "(int) 1\r\n").is_err());
    }

    #[test]
    fn test_first_divergent_line() {
        assert_eq!(first_divergent_line("a\nb\n", "a\nb\n"), None);
        assert_eq!(first_divergent_line("a\nb\n", "a\nc\n"), Some(2));
        assert_eq!(first_divergent_line("x\n", "a\n"), Some(1));
        assert_eq!(first_divergent_line("(nil)", "(nil)\n"), Some(1));
        assert_eq!(first_divergent_line("a\nb\n", "a\nb\nc\n"), Some(3));
        assert_eq!(first_divergent_line("", "(nil)\n"), Some(1));
    }
}
