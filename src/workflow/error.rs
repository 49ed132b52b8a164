use std::path::PathBuf;

use crate::gateway::GatewayError;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures surfaced by the stage machine and the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Input rejected before anything was started.
    #[error("{0}")]
    Validation(String),

    /// Three-step mode is on but the class name or base path is gone.
    #[error("Three-step state is missing its class name or base path")]
    StateMissing,

    #[error("Folder not found: {folder} ({})", path.display())]
    FolderNotFound { folder: String, path: PathBuf },

    #[error("Three-step mode is not enabled")]
    NotEnabled,

    #[error("{context}")]
    Filesystem {
        context: String,
        #[source]
        source: BoxedError,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl WorkflowError {
    /// Wrap a lower-level I/O failure with the step that was running.
    pub fn filesystem(context: impl Into<String>, error: anyhow::Error) -> Self {
        WorkflowError::Filesystem {
            context: context.into(),
            source: error.into(),
        }
    }

    /// Text to show the user. Never a raw error chain.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Validation(message) => message.clone(),
            WorkflowError::StateMissing => {
                "Three-step state is missing. Download a dataset with three-step mode on to start again."
                    .to_string()
            }
            WorkflowError::FolderNotFound { folder, .. } => format!("Folder not found: {folder}"),
            WorkflowError::NotEnabled => {
                "Three-step mode is not enabled. Run `tristep three-step enable` first.".to_string()
            }
            WorkflowError::Filesystem { context, source } => {
                format!("{context}: {}", root_cause(source.as_ref()))
            }
            WorkflowError::Gateway(error) => error.to_string(),
        }
    }
}

fn root_cause(error: &(dyn std::error::Error + 'static)) -> String {
    let mut current = error;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}
