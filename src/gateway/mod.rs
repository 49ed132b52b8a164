//! Adapters for the external Python scripts: trainer, predictor, downloader.
//!
//! Each adapter builds a command line, runs it as a [`ProcessTask`] under the
//! [`TaskSlot`] of its kind, streams progress to the caller, and turns the
//! exit status and captured output into a typed result. Nothing is retried.

pub mod classify;
pub mod downloader;
pub mod error;
pub mod predictor;
pub mod python;
pub mod trainer;

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use crate::config::Config;
use crate::process::{ProcessTask, ProgressLine, SlotBusy, TaskKind, TaskOutcome, TaskSlot};

pub use classify::{classify_output, ErrorCategory};
pub use downloader::{
    parse_download_progress, DownloadProgress, DownloadReport, DownloadRequest, Downloader,
};
pub use error::GatewayError;
pub use predictor::{parse_prediction_output, Detection, Prediction, Predictor};
pub use python::resolve_python;
pub use trainer::{Trainer, TrainingReport, TrainingRequest};

/// How a gateway call ended when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T> {
    Finished(T),
    /// Terminated on request; not an error.
    Stopped,
}

/// Interpreter and script location shared by the adapters.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub python: PathBuf,
    pub scripts_dir: PathBuf,
    pub grace: Duration,
}

impl Toolchain {
    pub fn new(python: impl Into<PathBuf>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            scripts_dir: scripts_dir.into(),
            grace: Duration::from_secs(5),
        }
    }

    /// Build from a config already resolved against the project root.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        Ok(Self {
            python: resolve_python(config)?,
            scripts_dir: config.scripts_dir.clone(),
            grace: config.stop_grace(),
        })
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn script_path(&self, script: &str) -> PathBuf {
        self.scripts_dir.join(script)
    }

    /// `python <scripts_dir>/<script>`, ready for arguments.
    pub fn script_command(&self, script: &str) -> Command {
        let mut command = Command::new(&self.python);
        command.arg(self.script_path(script));
        command
    }
}

/// Run a command under the slot of `kind`, streaming its output to `sink`.
pub(crate) fn run_in_slot<F>(
    tool: &'static str,
    kind: TaskKind,
    command: Command,
    grace: Duration,
    slots: &TaskSlot,
    sink: F,
) -> Result<TaskOutcome, GatewayError>
where
    F: FnMut(&ProgressLine),
{
    let claim = slots
        .claim(kind)
        .map_err(|SlotBusy(kind)| GatewayError::AlreadyRunning(kind))?;

    let task = ProcessTask::spawn(command, grace).map_err(|e| GatewayError::Spawn {
        tool,
        message: format!("{e:#}"),
    })?;
    claim.attach(task.handle());

    let outcome = task
        .wait(sink)
        .map_err(|e| GatewayError::Io(std::io::Error::other(format!("{e:#}"))))?;
    drop(claim);
    Ok(outcome)
}

/// Typed failure for a non-zero exit.
pub(crate) fn process_failure(tool: &'static str, outcome: &TaskOutcome) -> GatewayError {
    let category = classify_output(&outcome.combined_output());
    let message = classify::failure_message(tool, outcome.code(), category);
    tracing::error!(tool, code = ?outcome.code(), category = %category, "External process failed");
    GatewayError::ProcessFailed {
        tool,
        code: outcome.code(),
        category,
        message,
    }
}
