//! Execution of a single instance as a child process.
//!
//! The child runs in its own process group with stdin closed and both output
//! streams drained on helper threads. When `evaluate` returns, the group has
//! been killed and reaped, whether the solver finished or timed out. Output
//! still held open by processes that escaped the group is cut off after a
//! short grace period.
use crate::classify::FailureCategory;
use crate::model::Model;
use crate::query::Query;
use crate::schema::{SolverOutput, Verdict};
use crate::solver::Solver;
use anyhow::{Context, Result};
use std::io::{ErrorKind, Read};
use std::process::{Child, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// How long output readers get to reach end of stream once the solver's group
/// is gone. Descendants that left the group can hold the pipes open forever.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Outcome of running one instance.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessResult {
    Timeout {
        stdout: String,
        stderr: String,
        elapsed_secs: f64,
    },
    Error {
        stdout: String,
        stderr: String,
        elapsed_secs: f64,
        /// `None` when the solver was killed by a signal.
        exit_code: Option<i32>,
        category: FailureCategory,
    },
    Success {
        stdout: String,
        stderr: String,
        elapsed_secs: f64,
        output: SolverOutput,
    },
}

impl ProcessResult {
    pub fn elapsed_secs(&self) -> f64 {
        match self {
            ProcessResult::Timeout { elapsed_secs, .. }
            | ProcessResult::Error { elapsed_secs, .. }
            | ProcessResult::Success { elapsed_secs, .. } => *elapsed_secs,
        }
    }

    /// Short label for the report's message column.
    pub fn message(&self) -> String {
        match self {
            ProcessResult::Timeout { .. } => "Timeout".to_string(),
            ProcessResult::Error { category, .. } => category.to_string(),
            ProcessResult::Success { output, .. } => output.message.clone(),
        }
    }

    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            ProcessResult::Success { output, .. } => Some(output.verdict),
            ProcessResult::Timeout { .. } | ProcessResult::Error { .. } => None,
        }
    }

    /// Only a successful run with a correct answer validates.
    pub fn is_validated(&self) -> bool {
        self.verdict() == Some(Verdict::Correct)
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            ProcessResult::Timeout { .. } => "timeout",
            ProcessResult::Error { .. } => "error",
            ProcessResult::Success { .. } => "success",
        }
    }
}

/// Run `query` on `model` with `solver`, bounded by `timeout` when given.
///
/// Only a failure to start the solver is returned as an error; every outcome
/// of a started solver is a [`ProcessResult`].
pub fn evaluate(
    solver: &dyn Solver,
    model: &Model,
    query: &Query,
    timeout: Option<Duration>,
    validate: bool,
) -> Result<ProcessResult> {
    let invocation = solver.create_invocation(model, query, validate);
    tracing::debug!(command = %invocation.command_line(), "starting solver");

    let mut cmd = invocation.command();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    isolate_process_group(&mut cmd);

    let start = Instant::now();
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawn solver {}", invocation.program.display()))?;
    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let mut timed_out = false;
    loop {
        if has_exited(&mut child)? {
            break;
        }
        if timeout.is_some_and(|limit| start.elapsed() > limit) {
            timed_out = true;
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }
    let elapsed_secs = start.elapsed().as_secs_f64();

    // The leader is not reaped yet, so its pid still names the group.
    terminate(&mut child);
    let status = child.wait().context("reap solver")?;
    let deadline = Instant::now() + DRAIN_GRACE;
    let stdout = collect(stdout_reader, deadline);
    let stderr = collect(stderr_reader, deadline);

    if timed_out {
        tracing::info!(elapsed_secs, "solver timed out");
        return Ok(ProcessResult::Timeout {
            stdout,
            stderr,
            elapsed_secs,
        });
    }
    if !status.success() {
        let category = solver.classify_failure(&stderr);
        return Ok(ProcessResult::Error {
            stdout,
            stderr,
            elapsed_secs,
            exit_code: status.code(),
            category,
        });
    }
    let output = solver.check_output(&stdout, &stderr, model, query);
    Ok(ProcessResult::Success {
        stdout,
        stderr,
        elapsed_secs,
        output,
    })
}

#[cfg(unix)]
fn isolate_process_group(cmd: &mut std::process::Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_cmd: &mut std::process::Command) {}

/// Whether the solver has exited. On Linux the exit is observed without
/// reaping, leaving the zombie leader in place until [`terminate`] has run.
#[cfg(target_os = "linux")]
fn has_exited(child: &mut Child) -> Result<bool> {
    use nix::errno::Errno;
    use nix::sys::wait::{waitid, Id, WaitPidFlag, WaitStatus};
    use nix::unistd::Pid;

    let Ok(pid) = i32::try_from(child.id()) else {
        return Ok(child.try_wait().context("check solver status")?.is_some());
    };
    let flags = WaitPidFlag::WEXITED | WaitPidFlag::WNOHANG | WaitPidFlag::WNOWAIT;
    match waitid(Id::Pid(Pid::from_raw(pid)), flags) {
        Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => Ok(false),
        Ok(_) => Ok(true),
        Err(err) => Err(err).context("check solver status"),
    }
}

#[cfg(not(target_os = "linux"))]
fn has_exited(child: &mut Child) -> Result<bool> {
    Ok(child.try_wait().context("check solver status")?.is_some())
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // ESRCH once the group is empty
    let _ = killpg(Pid::from_raw(pgid), Signal::SIGKILL);
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.kill();
}

/// Output collected by a reader thread, readable before end of stream.
struct Drain {
    buffer: Arc<Mutex<Vec<u8>>>,
    finished: Receiver<()>,
}

fn drain<R>(stream: Option<R>) -> Option<Drain>
where
    R: Read + Send + 'static,
{
    stream.map(|mut stream| {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (done, finished) = mpsc::channel();
        let sink = Arc::clone(&buffer);
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match stream.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(read) => match sink.lock() {
                        Ok(mut buffer) => buffer.extend_from_slice(&chunk[..read]),
                        Err(_) => break,
                    },
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            let _ = done.send(());
        });
        Drain { buffer, finished }
    })
}

/// Whatever the reader has buffered once it hits end of stream or `deadline`
/// passes, whichever comes first.
fn collect(drain: Option<Drain>, deadline: Instant) -> String {
    let Some(drain) = drain else {
        return String::new();
    };
    let _ = drain
        .finished
        .recv_timeout(deadline.saturating_duration_since(Instant::now()));
    let bytes = drain
        .buffer
        .lock()
        .map(|buffer| buffer.clone())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
