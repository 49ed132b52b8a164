use std::path::PathBuf;

use crate::process::TaskKind;

use super::classify::ErrorCategory;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to start {tool}: {message}")]
    Spawn { tool: &'static str, message: String },

    /// Non-zero exit. `message` is the classified, user-facing text.
    #[error("{message}")]
    ProcessFailed {
        tool: &'static str,
        code: Option<i32>,
        category: ErrorCategory,
        message: String,
    },

    /// Zero exit without the output marker the caller depends on.
    #[error("{tool} finished but {what} was not found in its output")]
    MissingOutput {
        tool: &'static str,
        what: &'static str,
        output: String,
    },

    #[error("A {0} process is already running")]
    AlreadyRunning(TaskKind),

    #[error("No Python interpreter found (looked in {venv} and on PATH)")]
    InterpreterNotFound { venv: PathBuf },

    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            GatewayError::ProcessFailed { category, .. } => Some(*category),
            _ => None,
        }
    }
}
