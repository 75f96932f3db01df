//! Golden transcript replay
//!
//! Replays a corpus against a live server strictly in order. Each case is
//! executed only after the previous one has been judged, because every
//! case may depend on server state left by the ones before it. The first
//! failure ends the run, and the server is stopped on every exit path.

mod compare;
mod report;
mod runner;
mod server;

use serde::Serialize;
use tracing::Instrument;

use crate::common::config::ServerConfig;
use crate::common::{Error, Result};
use crate::corpus::{Corpus, TestCase};

pub use compare::{compare, first_divergent_line};
pub use report::{ConsoleReporter, JsonReporter, Reporter};
pub use runner::{tokenize, CommandRunner, Execute};
pub use server::ServerProcess;

/// Where a run currently is
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "phase", content = "case", rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    ServerUp,
    /// Executing the case at this index
    Running(usize),
    Passed,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Passed | RunState::Failed)
    }

    fn server_started(self) -> Self {
        debug_assert_eq!(self, RunState::NotStarted);
        RunState::ServerUp
    }

    fn begin(self, total: usize) -> Self {
        debug_assert_eq!(self, RunState::ServerUp);
        if total == 0 {
            RunState::Passed
        } else {
            RunState::Running(0)
        }
    }

    fn case_passed(self, total: usize) -> Self {
        match self {
            RunState::Running(i) if i + 1 < total => RunState::Running(i + 1),
            RunState::Running(_) => RunState::Passed,
            other => other,
        }
    }

    fn case_failed(self) -> Self {
        RunState::Failed
    }
}

/// Details of the failure that ended a run
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// Stable error identifier (e.g. `OUTPUT_MISMATCH`)
    pub kind: String,
    pub message: String,
    pub command: String,
    /// Captured stdout; absent when the command itself failed
    pub actual: Option<String>,
    pub expected: String,
}

impl FailureReport {
    pub fn new(case: &TestCase, error: &Error) -> Self {
        let actual = match error {
            Error::OutputMismatch { actual, .. } => Some(actual.clone()),
            _ => None,
        };
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
            command: case.command.clone(),
            actual,
            expected: case.expected_output.clone(),
        }
    }
}

/// Outcome of a full run
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: bool,
    pub state: RunState,
    /// Cases executed, including the one that failed
    pub cases_run: usize,
    pub cases_total: usize,
    pub failure: Option<FailureReport>,
}

impl RunSummary {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.passed {
            0
        } else {
            1
        }
    }
}

/// Judge every case in order, stopping at the first failure
///
/// Expects the server to be up already. No case is ever executed
/// concurrently with another.
pub async fn run_corpus(
    corpus: &Corpus,
    executor: &dyn Execute,
    reporter: &mut dyn Reporter,
) -> RunSummary {
    run_from(RunState::ServerUp, corpus, executor, reporter).await
}

async fn run_from(
    state: RunState,
    corpus: &Corpus,
    executor: &dyn Execute,
    reporter: &mut dyn Reporter,
) -> RunSummary {
    let total = corpus.len();
    let mut state = state.begin(total);
    let mut cases_run = 0;
    let mut failure = None;

    while let RunState::Running(index) = state {
        let case = &corpus.cases()[index];
        reporter.case_started(index, case);
        cases_run += 1;

        let span = tracing::debug_span!("case", index, command = %case.command);
        let outcome = async {
            let actual = executor.execute(&case.command).await?;
            compare(case, &actual)
        }
        .instrument(span)
        .await;

        match outcome {
            Ok(()) => {
                reporter.case_passed(index, case);
                state = state.case_passed(total);
            }
            Err(e) => {
                tracing::debug!(index, error = %e, "Case failed");
                reporter.case_failed(index, case, &e);
                failure = Some(FailureReport::new(case, &e));
                state = state.case_failed();
            }
        }
    }

    RunSummary {
        passed: state == RunState::Passed,
        state,
        cases_run,
        cases_total: total,
        failure,
    }
}

/// Start the server, replay the corpus, and always stop the server
///
/// Returns `Err` only when the server could not be started; every case
/// failure is reported through the returned summary. A failure to stop
/// the server is logged and never changes the outcome.
pub async fn replay(
    corpus: &Corpus,
    server_config: &ServerConfig,
    executor: &dyn Execute,
    reporter: &mut dyn Reporter,
) -> Result<RunSummary> {
    let state = RunState::NotStarted;
    reporter.run_started(corpus.len());

    let server = ServerProcess::start(server_config).await?;
    let state = state.server_started();
    tracing::debug!(?state, cases = corpus.len(), "Replaying corpus");

    let summary = run_from(state, corpus, executor, reporter).await;

    if let Err(e) = server.stop().await {
        tracing::warn!(error = %e, "Server cleanup failed");
    }

    tracing::info!(
        state = ?summary.state,
        cases_run = summary.cases_run,
        cases_total = summary.cases_total,
        "Run finished"
    );
    reporter.run_finished(&summary);
    Ok(summary)
}
