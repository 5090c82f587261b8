//! Process execution utilities
//!
//! Provides process execution with output capture, and a supervised mode
//! that watches a [`CancelToken`] while the child runs.

use crate::core::cancel::CancelToken;
use crate::error::{RelayError, Result};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How often a supervised child is polled for exit or cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long captured output may trail behind the child's exit
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Utility for running external processes
#[derive(Debug)]
pub struct ProcessRunner {
    debug: bool,
    grace_period: Duration,
}

/// Result of a process execution
#[derive(Debug)]
pub struct ProcessResult {
    /// Exit status code
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Whether the process was successful
    pub success: bool,
    /// Whether the process was stopped because its token was cancelled
    pub interrupted: bool,
}

impl ProcessRunner {
    /// Create a new process runner
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self {
            debug,
            grace_period: Duration::from_secs(5),
        }
    }

    /// Time a cancelled child gets between SIGTERM and SIGKILL
    #[must_use]
    pub const fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Run a command and capture its output, failing on a non-zero exit
    #[instrument(skip(self))]
    pub fn run_command_with_output(&self, command: &str, args: &[&str]) -> Result<ProcessResult> {
        let cmd_str = format!("{} {}", command, args.join(" "));

        debug!("Running command with output capture: {}", cmd_str);

        let output = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                RelayError::process(
                    cmd_str.clone(),
                    None,
                    format!("Failed to execute command: {e}"),
                )
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let success = output.status.success();
        let exit_code = output.status.code();

        debug!(
            "Command finished: success={}, exit_code={:?}, stdout_len={}, stderr_len={}",
            success,
            exit_code,
            stdout.len(),
            stderr.len()
        );

        if !success {
            debug!("Command stderr: {}", stderr);
            return Err(RelayError::process(cmd_str, exit_code, stderr));
        }

        Ok(ProcessResult {
            exit_code,
            stdout,
            stderr,
            success,
            interrupted: false,
        })
    }

    /// Run a command until it exits or `cancel` fires
    ///
    /// Stdin is inherited so the child can still talk to the terminal;
    /// stdout and stderr are captured. A non-zero exit is not an error here,
    /// the caller decides what exit codes mean. On cancellation the child
    /// receives SIGTERM and, after the grace period, SIGKILL.
    #[instrument(skip(self, args, env_vars, cancel))]
    pub fn run_supervised(
        &self,
        command: &str,
        args: &[String],
        env_vars: &[(String, String)],
        cancel: &CancelToken,
    ) -> Result<ProcessResult> {
        let cmd_str = format!("{} {}", command, args.join(" "));

        if self.debug {
            debug!("Running command: {}", cmd_str);
            if !env_vars.is_empty() {
                let keys: Vec<&str> = env_vars.iter().map(|(key, _)| key.as_str()).collect();
                debug!("Environment variables: {:?}", keys);
            }
        } else {
            info!("+ {}", cmd_str);
        }

        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| {
            RelayError::process(
                cmd_str.clone(),
                None,
                format!("Failed to execute command: {e}"),
            )
        })?;

        let stdout_rx = capture(child.stdout.take());
        let stderr_rx = capture(child.stderr.take());

        let mut interrupted = false;
        let status = loop {
            if let Some(status) = child
                .try_wait()
                .map_err(|e| RelayError::process(cmd_str.clone(), None, e.to_string()))?
            {
                break status;
            }
            if cancel.is_cancelled() {
                interrupted = true;
                break self
                    .terminate(&mut child)
                    .map_err(|e| RelayError::process(cmd_str.clone(), None, e.to_string()))?;
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = drain(&stdout_rx);
        let stderr = drain(&stderr_rx);
        let exit_code = status.code();

        debug!(
            "Supervised command finished: exit_code={:?}, interrupted={}, stdout_len={}, stderr_len={}",
            exit_code,
            interrupted,
            stdout.len(),
            stderr.len()
        );

        Ok(ProcessResult {
            exit_code,
            stdout,
            stderr,
            success: status.success() && !interrupted,
            interrupted,
        })
    }

    /// Stop a child: SIGTERM, wait out the grace period, then SIGKILL
    fn terminate(&self, child: &mut Child) -> std::io::Result<ExitStatus> {
        let pid = child.id();
        debug!("Terminating child process {}", pid);

        #[cfg(unix)]
        {
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;
            use std::time::Instant;

            if let Ok(raw) = i32::try_from(pid) {
                if let Err(e) = signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
                    warn!("Failed to send SIGTERM to {}: {}", pid, e);
                }
            }

            let start = Instant::now();
            while start.elapsed() < self.grace_period {
                if let Some(status) = child.try_wait()? {
                    debug!("Child process {} exited after SIGTERM", pid);
                    return Ok(status);
                }
                thread::sleep(POLL_INTERVAL);
            }
            warn!("Process {} did not terminate, sending SIGKILL", pid);
        }

        match child.kill() {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {}
            Err(e) => return Err(e),
        }
        child.wait()
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Read a child pipe to the end on its own thread
fn capture<R: Read + Send + 'static>(source: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut source) = source {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = source.read_to_end(&mut buffer);
            let _ = tx.send(String::from_utf8_lossy(&buffer).to_string());
        });
    }
    rx
}

/// Collect captured output; a pipe still held open by a grandchild is abandoned
fn drain(rx: &mpsc::Receiver<String>) -> String {
    rx.recv_timeout(DRAIN_TIMEOUT).unwrap_or_default()
}
