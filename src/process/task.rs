//! Child-process tasks with streamed output.
//!
//! A [`ProcessTask`] owns a spawned child. Its stdout and stderr are read on
//! two threads and pushed, line by line, into one channel; [`ProcessTask::wait`]
//! drains that channel into a caller-supplied sink until the child exits or a
//! [`TaskHandle`] asks it to stop.
//!
//! Stop sends `SIGTERM` to the child's process group, waits out a grace
//! period, then sends `SIGKILL` to the group. Pause and resume send `SIGSTOP` and `SIGCONT`; on
//! platforms without signals they report [`ControlResponse::Unsupported`].

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

/// How often `wait` looks for a stop request while the child is quiet.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lines kept per stream for error classification; older lines are dropped.
const MAX_CAPTURED_LINES: usize = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Stdout,
    Stderr,
}

/// One line of child output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressLine {
    pub stream: Stream,
    pub text: String,
}

/// Result of a pause, resume, or stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlResponse {
    Done,
    NoActiveOperation,
    Unsupported,
}

impl ControlResponse {
    pub fn is_done(&self) -> bool {
        matches!(self, ControlResponse::Done)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    /// The child exited on its own. `None` if it died from a signal.
    Exited(Option<i32>),
    /// The child was terminated through a [`TaskHandle`].
    Stopped,
}

#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub status: TaskStatus,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl TaskOutcome {
    pub fn success(&self) -> bool {
        matches!(self.status, TaskStatus::Exited(Some(0)))
    }

    pub fn was_stopped(&self) -> bool {
        matches!(self.status, TaskStatus::Stopped)
    }

    pub fn code(&self) -> Option<i32> {
        match self.status {
            TaskStatus::Exited(code) => code,
            TaskStatus::Stopped => None,
        }
    }

    /// Stderr followed by stdout, newline-joined.
    pub fn combined_output(&self) -> String {
        self.stderr
            .iter()
            .chain(self.stdout.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Default)]
struct Shared {
    stop_requested: AtomicBool,
    paused: AtomicBool,
    finished: AtomicBool,
}

/// Cloneable control surface of a running task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    pid: u32,
    shared: Arc<Shared>,
}

impl TaskHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_running(&self) -> bool {
        !self.shared.finished.load(Ordering::SeqCst)
            && !self.shared.stop_requested.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::SeqCst)
    }

    /// Terminate the task. Output produced after this call is discarded.
    pub fn stop(&self) -> ControlResponse {
        if !self.is_running() {
            return ControlResponse::NoActiveOperation;
        }
        self.shared.stop_requested.store(true, Ordering::SeqCst);

        #[cfg(unix)]
        {
            use nix::sys::signal::Signal;
            if let Err(e) = signal_group(self.pid, Signal::SIGTERM) {
                tracing::debug!(pid = self.pid, error = %e, "SIGTERM failed");
            }
            // A stopped process only acts on SIGTERM once continued.
            if self.shared.paused.swap(false, Ordering::SeqCst) {
                let _ = signal_group(self.pid, Signal::SIGCONT);
            }
        }

        tracing::info!(pid = self.pid, "Stop requested");
        ControlResponse::Done
    }

    /// Suspend the task.
    pub fn pause(&self) -> ControlResponse {
        #[cfg(unix)]
        {
            use nix::sys::signal::Signal;
            if !self.is_running() || self.is_paused() {
                return ControlResponse::NoActiveOperation;
            }
            match signal_group(self.pid, Signal::SIGSTOP) {
                Ok(()) => {
                    self.shared.paused.store(true, Ordering::SeqCst);
                    tracing::info!(pid = self.pid, "Paused");
                    ControlResponse::Done
                }
                Err(e) => {
                    tracing::warn!(pid = self.pid, error = %e, "SIGSTOP failed");
                    ControlResponse::NoActiveOperation
                }
            }
        }
        #[cfg(not(unix))]
        {
            ControlResponse::Unsupported
        }
    }

    /// Continue a paused task.
    pub fn resume(&self) -> ControlResponse {
        #[cfg(unix)]
        {
            use nix::sys::signal::Signal;
            if !self.is_running() || !self.is_paused() {
                return ControlResponse::NoActiveOperation;
            }
            match signal_group(self.pid, Signal::SIGCONT) {
                Ok(()) => {
                    self.shared.paused.store(false, Ordering::SeqCst);
                    tracing::info!(pid = self.pid, "Resumed");
                    ControlResponse::Done
                }
                Err(e) => {
                    tracing::warn!(pid = self.pid, error = %e, "SIGCONT failed");
                    ControlResponse::NoActiveOperation
                }
            }
        }
        #[cfg(not(unix))]
        {
            ControlResponse::Unsupported
        }
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) -> std::io::Result<()> {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let pid = i32::try_from(pid)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "pid out of range"))?;
    killpg(Pid::from_raw(pid), signal).map_err(std::io::Error::from)
}

/// Shell-quoted rendering of a command, for logs.
pub fn render_command(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| shell_escape::escape(part.to_string_lossy()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A spawned child whose output has not been consumed yet.
pub struct ProcessTask {
    child: Child,
    lines: Receiver<ProgressLine>,
    handle: TaskHandle,
    grace: Duration,
}

impl ProcessTask {
    /// Spawn `command` with piped output in its own process group.
    ///
    /// `grace` is how long a stopped child may take to exit before it is
    /// killed.
    pub fn spawn(mut command: Command, grace: Duration) -> Result<Self> {
        let rendered = render_command(&command);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn command: {rendered}"))?;
        tracing::info!(pid = child.id(), command = %rendered, "Spawned child process");

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, Stream::Stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, Stream::Stderr, tx);
        }

        let handle = TaskHandle {
            pid: child.id(),
            shared: Arc::new(Shared::default()),
        };

        Ok(Self {
            child,
            lines: rx,
            handle,
            grace,
        })
    }

    pub fn handle(&self) -> TaskHandle {
        self.handle.clone()
    }

    /// Stream output into `sink` until the child exits or is stopped.
    ///
    /// Stdout lines arrive in the order the child wrote them; stderr lines are
    /// interleaved as they come.
    pub fn wait<F>(mut self, mut sink: F) -> Result<TaskOutcome>
    where
        F: FnMut(&ProgressLine),
    {
        let mut stdout = VecDeque::new();
        let mut stderr = VecDeque::new();
        let shared = Arc::clone(&self.handle.shared);
        let stop_requested = || shared.stop_requested.load(Ordering::SeqCst);

        while !stop_requested() {
            match self.lines.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    let buffer = match line.stream {
                        Stream::Stdout => &mut stdout,
                        Stream::Stderr => &mut stderr,
                    };
                    if buffer.len() == MAX_CAPTURED_LINES {
                        buffer.pop_front();
                    }
                    buffer.push_back(line.text.clone());
                    sink(&line);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = if stop_requested() {
            self.terminate()?;
            TaskStatus::Stopped
        } else {
            let exit = self
                .child
                .wait()
                .context("Failed to wait for child process")?;
            TaskStatus::Exited(exit.code())
        };
        shared.finished.store(true, Ordering::SeqCst);
        tracing::info!(pid = self.handle.pid, status = ?status, "Child process finished");

        Ok(TaskOutcome {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        })
    }

    /// Wait out the grace period, then kill whatever is left of the group.
    ///
    /// The group is killed even when the leader exited in time, so workers it
    /// forked do not outlive it.
    fn terminate(&mut self) -> Result<()> {
        let exited = if cfg!(unix) {
            self.child
                .wait_timeout(self.grace)
                .context("Failed to wait for stopped child")?
                .is_some()
        } else {
            false
        };

        #[cfg(unix)]
        {
            use nix::sys::signal::Signal;
            match signal_group(self.handle.pid, Signal::SIGKILL) {
                Ok(()) => tracing::debug!(pid = self.handle.pid, "Killed process group"),
                Err(e) => tracing::debug!(pid = self.handle.pid, error = %e, "Process group already gone"),
            }
        }

        if !exited {
            #[cfg(not(unix))]
            {
                tracing::debug!(pid = self.handle.pid, "Killing child process");
                let _ = self.child.kill();
            }
            self.child
                .wait()
                .context("Failed to reap killed child")?;
        }
        Ok(())
    }
}

fn spawn_reader<R>(stream: R, kind: Stream, tx: Sender<ProgressLine>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    if tx.send(ProgressLine { stream: kind, text }).is_err() {
                        break;
                    }
                }
            }
        }
    });
}
