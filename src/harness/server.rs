//! Server lifecycle
//!
//! The server is launched once per run, given a fixed warm-up delay to
//! bind and listen, and terminated once at the end. The warm-up is a
//! timing heuristic, not a readiness check.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::common::config::ServerConfig;
use crate::common::{Error, Result};

use super::runner::tokenize;

/// Handle to the running server process
///
/// Owns the process exclusively. `stop` consumes the handle, so
/// termination happens at most once; dropping a handle that was never
/// stopped force-kills the process.
pub struct ServerProcess {
    child: Child,
    command: String,
    grace: Duration,
    drains: Vec<JoinHandle<()>>,
}

impl ServerProcess {
    /// Spawn the server in the background and wait out the warm-up delay
    pub async fn start(config: &ServerConfig) -> Result<Self> {
        let argv = tokenize(&config.command)
            .map_err(|f| Error::ServerStartFailed(format!("'{}': {}", config.command, f)))?;

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            Error::ServerStartFailed(format!("Failed to start '{}': {}", config.command, e))
        })?;

        tracing::info!(pid = child.id(), command = %config.command, "Server spawned");

        // Keep the pipes drained so a chatty server never blocks on write
        let mut drains = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            drains.push(tokio::spawn(drain("stdout", stdout)));
        }
        if let Some(stderr) = child.stderr.take() {
            drains.push(tokio::spawn(drain("stderr", stderr)));
        }

        let mut server = Self {
            child,
            command: config.command.clone(),
            grace: config.shutdown_grace(),
            drains,
        };

        tracing::debug!(warmup_ms = config.warmup_ms, "Waiting for server warm-up");
        tokio::time::sleep(config.warmup()).await;

        match server.child.try_wait()? {
            Some(status) if !status.success() => {
                server.abort_drains();
                return Err(Error::ServerStartFailed(format!(
                    "'{}' exited during warm-up ({})",
                    server.command, status
                )));
            }
            // A launcher that backgrounds the real server and returns
            Some(status) => {
                tracing::info!(%status, command = %server.command, "Server launcher exited during warm-up");
            }
            None => {}
        }

        Ok(server)
    }

    /// OS process id, if the process has not been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Request graceful termination, escalating to a kill after the grace period
    pub async fn stop(mut self) -> Result<()> {
        let result = self.terminate().await;
        self.abort_drains();
        result
    }

    async fn terminate(&mut self) -> Result<()> {
        if let Some(status) = self.child.try_wait()? {
            tracing::warn!(%status, command = %self.command, "Server exited before shutdown");
            return Ok(());
        }

        self.request_shutdown();

        match tokio::time::timeout(self.grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(%status, "Server stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(Error::ServerStopFailed(e.to_string())),
            Err(_) => {
                tracing::warn!(
                    grace_ms = self.grace.as_millis() as u64,
                    "Server ignored shutdown request, killing"
                );
                self.child
                    .kill()
                    .await
                    .map_err(|e| Error::ServerStopFailed(e.to_string()))
            }
        }
    }

    #[cfg(unix)]
    fn request_shutdown(&mut self) {
        if let Some(pid) = self.child.id() {
            // SAFETY: pid belongs to our unreaped child, so it cannot have been recycled
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc != 0 {
                tracing::warn!(
                    error = %std::io::Error::last_os_error(),
                    "Failed to send SIGTERM to server"
                );
            }
        }
    }

    #[cfg(not(unix))]
    fn request_shutdown(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::warn!(error = %e, "Failed to terminate server");
        }
    }

    fn abort_drains(&mut self) {
        for task in self.drains.drain(..) {
            task.abort();
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        // Best-effort: we can't await in drop
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.start_kill();
        }
        self.abort_drains();
    }
}

/// Forward server output into the log, line by line, until EOF
async fn drain<R>(stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => tracing::debug!(target: "replay::server", stream, "{line}"),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(target: "replay::server", stream, error = %e, "Stopped reading server output");
                break;
            }
        }
    }
}
