//! Server cleanup guarantees
//!
//! Whatever case fails, and however it fails, the server process must be
//! gone by the time the run returns.

#![cfg(unix)]

use std::path::Path;
use std::time::Duration;

use replay::common::config::ServerConfig;
use replay::harness::{CommandRunner, Reporter};
use replay::{replay, Corpus, Error, RunState, TestCase};

/// Reporter that prints nothing
struct Silent;

impl Reporter for Silent {
    fn case_passed(&mut self, _index: usize, _case: &TestCase) {}
    fn case_failed(&mut self, _index: usize, _case: &TestCase, _error: &Error) {}
}

/// Server that records its pid, then sleeps until signalled
fn pid_recording_server(pid_file: &Path) -> ServerConfig {
    let script = format!(
        "echo $$ > {}; exec sleep 30",
        shell_words::quote(pid_file.to_str().unwrap())
    );
    ServerConfig {
        command: shell_words::join(["sh", "-c", script.as_str()]),
        warmup_ms: 200,
        shutdown_grace_ms: 1000,
        working_dir: None,
    }
}

fn read_pid(pid_file: &Path) -> libc::pid_t {
    std::fs::read_to_string(pid_file)
        .expect("server never wrote its pid")
        .trim()
        .parse()
        .expect("pid file is not a number")
}

fn alive(pid: libc::pid_t) -> bool {
    unsafe { libc::kill(pid, 0) == 0 }
}

/// Three cases where case `k` fails, either by mismatch or by a failing command
fn corpus_failing_at(k: usize, by_exit_code: bool) -> Corpus {
    let mut text = String::new();
    for i in 0..3 {
        if i == k && by_exit_code {
            text.push_str("$ sh -c 'exit 7'\n");
        } else {
            text.push_str(&format!("$ printf 'case {i}\\n'\n"));
            let expected = if i == k { "wrong" } else { "case" };
            text.push_str(&format!("{expected} {i}\n"));
        }
    }
    Corpus::parse(&text).unwrap()
}

#[tokio::test]
async fn test_server_terminated_after_each_failure_point() {
    for by_exit_code in [false, true] {
        for k in 0..3 {
            let dir = tempfile::tempdir().unwrap();
            let pid_file = dir.path().join("server.pid");
            let corpus = corpus_failing_at(k, by_exit_code);

            let summary = replay(
                &corpus,
                &pid_recording_server(&pid_file),
                &CommandRunner::new(),
                &mut Silent,
            )
            .await
            .unwrap();

            assert_eq!(summary.state, RunState::Failed, "k={k} exit={by_exit_code}");
            assert_eq!(summary.cases_run, k + 1);
            let pid = read_pid(&pid_file);
            assert!(!alive(pid), "server {pid} survived failure at case {k}");
        }
    }
}

#[tokio::test]
async fn test_server_terminated_after_passing_run() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("server.pid");
    let corpus = Corpus::parse("$ printf 'ok\\n'\nok\n").unwrap();

    let summary = replay(
        &corpus,
        &pid_recording_server(&pid_file),
        &CommandRunner::new(),
        &mut Silent,
    )
    .await
    .unwrap();

    assert!(summary.passed);
    assert!(!alive(read_pid(&pid_file)));
}

#[tokio::test]
async fn test_server_that_died_early_does_not_mask_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("server.pid");
    // The first case kills the server; stopping it afterwards must not fail the run
    let corpus = Corpus::parse(&format!(
        "$ sh -c {}\n",
        shell_words::quote(&format!("kill $(cat {})", pid_file.display()))
    ))
    .unwrap();

    let summary = replay(
        &corpus,
        &pid_recording_server(&pid_file),
        &CommandRunner::new(),
        &mut Silent,
    )
    .await
    .unwrap();

    assert!(summary.passed, "{summary:?}");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!alive(read_pid(&pid_file)));
}
