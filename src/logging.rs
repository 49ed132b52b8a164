//! Tracing subscriber setup.
//!
//! Human-readable output goes to stderr so command output on stdout stays
//! clean. When a work directory is available a plain-text copy is appended to
//! `.tristep/logs/tristep.log`.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "TRISTEP_LOG";
const LOG_FILE_NAME: &str = "tristep.log";

static INITIALIZED: OnceLock<()> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to open log file at {path}: {source}")]
    OpenLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Raise the default level from `info` to `debug`.
    pub verbose: bool,
    /// Folder for the log file; stderr only when `None`.
    pub log_dir: Option<PathBuf>,
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(options: LogOptions) -> Result<(), LoggingError> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }

    let default_level = if options.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let file_layer = match options.log_dir.as_deref() {
        Some(dir) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(dir)?)),
        ),
        None => None,
    };

    let subscriber = Registry::default()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = INITIALIZED.set(());

    tracing::debug!("Logging initialized");
    Ok(())
}

fn open_log_file(dir: &Path) -> Result<fs::File, LoggingError> {
    fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(LOG_FILE_NAME);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::OpenLogFile { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_dir() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("logs");
        open_log_file(&dir).unwrap();
        assert!(dir.join(LOG_FILE_NAME).is_file());
    }

    #[test]
    fn test_open_log_file_reports_path() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("logs");
        fs::write(&blocker, "not a dir").unwrap();

        let err = open_log_file(&blocker).unwrap_err();
        assert!(matches!(err, LoggingError::CreateDir { .. }));
    }
}
