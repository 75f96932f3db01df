//! Run reporting
//!
//! Reporters observe a run; they never influence it. The console reporter
//! prints one line per judged case as it happens, the JSON reporter emits
//! a single summary document at the end.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::common::Error;
use crate::corpus::TestCase;

use super::compare::first_divergent_line;
use super::RunSummary;

/// Observer of run progress
pub trait Reporter: Send {
    fn run_started(&mut self, _total: usize) {}

    fn case_started(&mut self, _index: usize, _case: &TestCase) {}

    fn case_passed(&mut self, index: usize, case: &TestCase);

    fn case_failed(&mut self, index: usize, case: &TestCase, error: &Error);

    fn run_finished(&mut self, _summary: &RunSummary) {}
}

/// Human-readable reporter with an optional progress bar on stderr
pub struct ConsoleReporter {
    bar: ProgressBar,
    show_progress: bool,
    total: usize,
}

impl ConsoleReporter {
    pub fn new(show_progress: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            show_progress,
            total: 0,
        }
    }

    fn print(&self, line: String) {
        self.bar.suspend(|| println!("{line}"));
    }
}

impl Reporter for ConsoleReporter {
    fn run_started(&mut self, total: usize) {
        self.total = total;
        if self.show_progress {
            self.bar = ProgressBar::new(total as u64);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {wide_msg}")
            {
                self.bar.set_style(style.progress_chars("=> "));
            }
        }
    }

    fn case_started(&mut self, _index: usize, case: &TestCase) {
        self.bar.set_message(case.command.clone());
    }

    fn case_passed(&mut self, _index: usize, case: &TestCase) {
        self.print(format!("✔ Test passed: {}", case.command).green().to_string());
        self.bar.inc(1);
    }

    fn case_failed(&mut self, index: usize, case: &TestCase, error: &Error) {
        self.print(format!("✖ Test failed: {error}").red().to_string());
        self.print(format!("  {}", format!("case {} of {}", index + 1, self.total).dimmed()));

        self.print(format!("  {}", "expected:".cyan()));
        self.print(indent(&case.expected_output));
        if let Error::OutputMismatch { actual, .. } = error {
            self.print(format!("  {}", "actual:".cyan()));
            self.print(indent(actual));
            if let Some(line) = first_divergent_line(actual, &case.expected_output) {
                self.print(format!("  {} line {}", "first difference at".dimmed(), line));
            }
        }
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        self.bar.finish_and_clear();
        if summary.passed {
            self.print(format!(
                "\n{} {}",
                "✓".green().bold(),
                format!("{}/{} cases passed", summary.cases_total, summary.cases_total)
                    .green()
                    .bold()
            ));
        } else {
            self.print(format!(
                "\n{} {}",
                "✗".red().bold(),
                format!(
                    "Failed at case {} of {}",
                    summary.cases_run, summary.cases_total
                )
                .red()
                .bold()
            ));
        }
    }
}

/// Print the run summary as a single JSON document on stdout
#[derive(Debug, Default)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn case_passed(&mut self, index: usize, case: &TestCase) {
        tracing::debug!(index, command = %case.command, "Case passed");
    }

    fn case_failed(&mut self, index: usize, case: &TestCase, error: &Error) {
        tracing::debug!(index, command = %case.command, %error, "Case failed");
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "Failed to serialize run summary"),
        }
    }
}

/// Render text as an indented block, making a missing final newline visible
fn indent(text: &str) -> String {
    if text.is_empty() {
        return format!("    {}", "(empty)".dimmed());
    }
    let mut block = text
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    if !text.ends_with('\n') {
        block.push_str(&format!(" {}", "(no newline at end)".dimmed()));
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_block() {
        colored::control::set_override(false);
        assert_eq!(indent("(arr) len=0\n(arr) end\n"), "    (arr) len=0\n    (arr) end");
        assert_eq!(indent("(nil)"), "    (nil) (no newline at end)");
        assert_eq!(indent(""), "    (empty)");
    }
}
